//! Append-only material change history

use crate::models::{HistoryRecord, NewHistoryRecord};
use crate::Result;
use chrono::NaiveDateTime;
use sqlx::{Connection, Row, SqliteConnection};

/// Insert one confirmed change and return its row id
///
/// `now` supplies the server-side date, time and created_at. The record must
/// already be validated. The insert runs in a transaction that rolls back on
/// any failure. There is no deduplication: each call creates a new row.
pub async fn insert_history(
    conn: &mut SqliteConnection,
    record: &NewHistoryRecord,
    now: NaiveDateTime,
) -> Result<i64> {
    let mut tx = conn.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO historial_cambio_material_imd
            (fecha, hora, line, posicion_de_feeder, qr_almacen, numero_de_parte, spec,
             qr_de_proveedor, numero_de_lote_proveedor, polaridad, persona, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(now.date())
    .bind(now.time())
    .bind(&record.line)
    .bind(&record.feeder_position)
    .bind(&record.qr_warehouse)
    .bind(&record.part_number)
    .bind(&record.spec)
    .bind(&record.qr_supplier)
    .bind(&record.supplier_lot)
    .bind(&record.polarity)
    .bind(&record.operator)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(result.last_insert_rowid())
}

/// Read back one history row by id
pub async fn fetch_history_record(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<HistoryRecord>> {
    let row = sqlx::query(
        "SELECT id, fecha, hora, line, posicion_de_feeder, qr_almacen, numero_de_parte, spec,
                qr_de_proveedor, numero_de_lote_proveedor, polaridad, persona, created_at
         FROM historial_cambio_material_imd
         WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(HistoryRecord {
        id: row.try_get("id")?,
        date: row.try_get("fecha")?,
        time: row.try_get("hora")?,
        line: row.try_get("line")?,
        feeder_position: row.try_get("posicion_de_feeder")?,
        qr_warehouse: row.try_get("qr_almacen")?,
        part_number: row.try_get("numero_de_parte")?,
        spec: row.try_get("spec")?,
        qr_supplier: row.try_get("qr_de_proveedor")?,
        supplier_lot: row.try_get("numero_de_lote_proveedor")?,
        polarity: row.try_get("polaridad")?,
        operator: row.try_get("persona")?,
        created_at: row.try_get("created_at")?,
    }))
}
