//! Versioned schema migrations
//!
//! Runs once per store profile, on the first connection to it. Progress is
//! tracked in the `schema_version` table and every step checks the live schema
//! before changing it, so re-running is harmless.
//!
//! 1. **Never modify existing migrations** - stores in the field depend on them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Use ALTER TABLE** - preserve audit rows, never drop and recreate

use crate::db::init::{create_history_table, create_reference_table, create_schema_version_table};
use crate::Result;
use sqlx::SqliteConnection;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from the store
///
/// Returns 0 if schema_version has no rows
pub async fn get_schema_version(conn: &mut SqliteConnection) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(conn: &mut SqliteConnection, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    create_schema_version_table(conn).await?;
    let current_version = get_schema_version(conn).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Store schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Store schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running store migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(conn).await?;
        set_schema_version(conn, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(conn).await?;
        set_schema_version(conn, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: create reference and history tables if absent
async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
    info!("Running migration v1: create reference and history tables");
    create_reference_table(conn).await?;
    create_history_table(conn).await?;
    Ok(())
}

/// Migration v2: add `line` to history tables created before it existed
async fn migrate_v2(conn: &mut SqliteConnection) -> Result<()> {
    info!("Running migration v2: ensure history.line column");

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('historial_cambio_material_imd') WHERE name = 'line'",
    )
    .fetch_one(&mut *conn)
    .await?;

    if has_column == 0 {
        sqlx::query("ALTER TABLE historial_cambio_material_imd ADD COLUMN line TEXT DEFAULT NULL")
            .execute(&mut *conn)
            .await?;
        info!("  ✓ Added line column to historial_cambio_material_imd");
    } else {
        info!("  line column already exists - skipping");
    }

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_history_line ON historial_cambio_material_imd (line)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}
