//! Reference table lookup

use crate::models::{ReferenceEntry, ReferenceKey};
use crate::Result;
use sqlx::{Row, SqliteConnection};

/// Look up the reference row for a normalized key
///
/// Matching is case-insensitive on all three columns for ASCII letters; other
/// characters must match exactly. When the table holds duplicates for a key,
/// the lowest id wins.
pub async fn find_reference_entry(
    conn: &mut SqliteConnection,
    key: &ReferenceKey,
) -> Result<Option<ReferenceEntry>> {
    let row = sqlx::query(
        "SELECT no_part, line, feeder, polarity, spec
         FROM imd_feeders_location_data
         WHERE UPPER(no_part) = UPPER(?) AND UPPER(machine) = ? AND UPPER(line) = ?
         ORDER BY id
         LIMIT 1",
    )
    .bind(&key.part_number)
    .bind(key.machine.as_str())
    .bind(&key.line)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(ReferenceEntry {
        part_number: row.try_get("no_part")?,
        machine: key.machine,
        line: row.try_get("line")?,
        feeder: row.try_get("feeder")?,
        polarity: row.try_get("polarity")?,
        spec: row.try_get::<Option<String>, _>("spec")?.unwrap_or_default(),
    }))
}
