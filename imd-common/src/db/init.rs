//! Table definitions for the reference and history stores
//!
//! The reference table is maintained outside this service; it is created here
//! only so a fresh store is usable. The history table is append-only.

use crate::Result;
use sqlx::SqliteConnection;

/// Reference table: (part number, machine, line) -> feeder, polarity, spec
pub(crate) async fn create_reference_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS imd_feeders_location_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            line TEXT NOT NULL,
            machine TEXT NOT NULL,
            feeder TEXT NOT NULL,
            no_part TEXT NOT NULL,
            spec TEXT,
            polarity TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_feeders_lookup
         ON imd_feeders_location_data (no_part, machine, line)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Create the history table with the current column set
///
/// Stores created by older releases may already hold this table without the
/// `line` column; migration v2 takes care of those.
pub(crate) async fn create_history_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS historial_cambio_material_imd (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fecha DATE NOT NULL,
            hora TIME NOT NULL,
            line TEXT,
            posicion_de_feeder TEXT NOT NULL,
            qr_almacen TEXT NOT NULL,
            numero_de_parte TEXT NOT NULL,
            spec TEXT,
            qr_de_proveedor TEXT,
            numero_de_lote_proveedor TEXT,
            polaridad TEXT,
            persona TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_history_part_number ON historial_cambio_material_imd (numero_de_parte)",
        "CREATE INDEX IF NOT EXISTS idx_history_fecha ON historial_cambio_material_imd (fecha)",
        "CREATE INDEX IF NOT EXISTS idx_history_created_at ON historial_cambio_material_imd (created_at)",
    ] {
        sqlx::query(statement).execute(&mut *conn).await?;
    }

    Ok(())
}

pub(crate) async fn create_schema_version_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}
