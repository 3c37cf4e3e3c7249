//! Integration tests for store schema, reference lookup and history inserts
//!
//! Each test works on a throwaway SQLite file in a temp directory.

use chrono::NaiveDate;
use imd_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use imd_common::db::{fetch_history_record, find_reference_entry, insert_history, run_migrations};
use imd_common::{Machine, NewHistoryRecord, ReferenceKey};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, SqliteConnection};
use tempfile::TempDir;

async fn open_store(dir: &TempDir) -> SqliteConnection {
    SqliteConnectOptions::new()
        .filename(dir.path().join("imd.db"))
        .create_if_missing(true)
        .connect()
        .await
        .expect("Should open test store")
}

async fn migrated_store(dir: &TempDir) -> SqliteConnection {
    let mut conn = open_store(dir).await;
    run_migrations(&mut conn).await.expect("Migrations should succeed");
    conn
}

async fn insert_reference(
    conn: &mut SqliteConnection,
    part: &str,
    machine: &str,
    line: &str,
    feeder: &str,
    polarity: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO imd_feeders_location_data (line, machine, feeder, no_part, spec, polarity)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(line)
    .bind(machine)
    .bind(feeder)
    .bind(part)
    .bind("10K 1/4W")
    .bind(polarity)
    .execute(&mut *conn)
    .await
    .unwrap();
}

fn sample_record() -> NewHistoryRecord {
    NewHistoryRecord {
        feeder_position: "AXIAL_3".to_string(),
        qr_warehouse: "R10K-LOT1,500".to_string(),
        part_number: "R10K".to_string(),
        spec: "10K 1/4W".to_string(),
        qr_supplier: "SUP-QR-77".to_string(),
        supplier_lot: "LOT-2024-11".to_string(),
        polarity: "+".to_string(),
        operator: "OPERADOR1".to_string(),
        line: "PANA_A".to_string(),
    }
}

fn fixed_now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(14, 30, 5)
        .unwrap()
}

#[tokio::test]
async fn test_migrations_create_tables_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&mut conn)
    .await
    .unwrap();

    assert!(tables.contains(&"imd_feeders_location_data".to_string()));
    assert!(tables.contains(&"historial_cambio_material_imd".to_string()));
    assert_eq!(
        get_schema_version(&mut conn).await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;

    run_migrations(&mut conn).await.expect("Second run should succeed");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
}

#[tokio::test]
async fn test_legacy_history_table_gains_line_column() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_store(&dir).await;

    // History table as shipped before production lines were tracked
    sqlx::query(
        "CREATE TABLE historial_cambio_material_imd (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fecha DATE NOT NULL,
            hora TIME NOT NULL,
            posicion_de_feeder TEXT NOT NULL,
            qr_almacen TEXT NOT NULL,
            numero_de_parte TEXT NOT NULL,
            spec TEXT,
            qr_de_proveedor TEXT,
            numero_de_lote_proveedor TEXT,
            polaridad TEXT,
            persona TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&mut conn)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO historial_cambio_material_imd
            (fecha, hora, posicion_de_feeder, qr_almacen, numero_de_parte)
         VALUES ('2024-01-02', '08:00:00', 'RADIAL_1', 'OLD-QR', 'OLD')",
    )
    .execute(&mut conn)
    .await
    .unwrap();

    run_migrations(&mut conn).await.unwrap();

    let has_line: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('historial_cambio_material_imd') WHERE name = 'line'",
    )
    .fetch_one(&mut conn)
    .await
    .unwrap();
    assert_eq!(has_line, 1);

    let old = fetch_history_record(&mut conn, 1).await.unwrap().unwrap();
    assert_eq!(old.part_number, "OLD");
    assert_eq!(old.line, None);

    // New inserts work against the migrated table
    let id = insert_history(&mut conn, &sample_record(), fixed_now())
        .await
        .unwrap();
    assert_eq!(id, 2);
}

#[tokio::test]
async fn test_reference_lookup_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;
    insert_reference(&mut conn, "R10K", "AXIAL", "PANA_A", "A3", Some("+")).await;

    let key = ReferenceKey::new("r10k", "axial", "pana_a").unwrap();
    let entry = find_reference_entry(&mut conn, &key)
        .await
        .unwrap()
        .expect("Entry should be found");

    assert_eq!(entry.part_number, "R10K");
    assert_eq!(entry.machine, Machine::Axial);
    assert_eq!(entry.feeder, "A3");
    assert_eq!(entry.polarity.as_deref(), Some("+"));
    assert_eq!(entry.spec, "10K 1/4W");
    assert_eq!(entry.feeder_position(), "AXIAL_A3");
}

#[tokio::test]
async fn test_reference_lookup_respects_machine_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;
    insert_reference(&mut conn, "C22", "RADIAL", "PANA_B", "7", None).await;

    let wrong_machine = ReferenceKey::new("C22", "AXIAL", "PANA_B").unwrap();
    assert!(find_reference_entry(&mut conn, &wrong_machine)
        .await
        .unwrap()
        .is_none());

    let wrong_line = ReferenceKey::new("C22", "RADIAL", "PANA_A").unwrap();
    assert!(find_reference_entry(&mut conn, &wrong_line)
        .await
        .unwrap()
        .is_none());

    let right = ReferenceKey::new("C22", "RADIAL", "PANA_B").unwrap();
    let entry = find_reference_entry(&mut conn, &right).await.unwrap().unwrap();
    assert_eq!(entry.polarity, None);
}

#[tokio::test]
async fn test_reference_lookup_with_non_ascii_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;
    insert_reference(&mut conn, "Q1", "AXIAL", "línea_1", "9", None).await;

    let exact = ReferenceKey::new("Q1", "AXIAL", "línea_1").unwrap();
    let entry = find_reference_entry(&mut conn, &exact)
        .await
        .unwrap()
        .expect("Exact line should match");
    assert_eq!(entry.line, "línea_1");
    assert_eq!(entry.feeder, "9");

    let ascii_case = ReferenceKey::new("q1", "axial", "LíNEA_1").unwrap();
    assert!(find_reference_entry(&mut conn, &ascii_case)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_duplicate_reference_rows_take_first() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;
    insert_reference(&mut conn, "D1", "AXIAL", "PANA_A", "first", None).await;
    insert_reference(&mut conn, "D1", "AXIAL", "PANA_A", "second", None).await;

    let key = ReferenceKey::new("D1", "AXIAL", "PANA_A").unwrap();
    let entry = find_reference_entry(&mut conn, &key).await.unwrap().unwrap();
    assert_eq!(entry.feeder, "first");
}

#[tokio::test]
async fn test_history_insert_assigns_server_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;

    let id = insert_history(&mut conn, &sample_record(), fixed_now())
        .await
        .unwrap();
    let stored = fetch_history_record(&mut conn, id).await.unwrap().unwrap();

    assert_eq!(stored.date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    assert_eq!(stored.time, fixed_now().time());
    assert_eq!(stored.created_at, fixed_now());
    assert_eq!(stored.line.as_deref(), Some("PANA_A"));
    assert_eq!(stored.feeder_position, "AXIAL_3");
    assert_eq!(stored.qr_warehouse, "R10K-LOT1,500");
    assert_eq!(stored.operator.as_deref(), Some("OPERADOR1"));
}

#[tokio::test]
async fn test_identical_history_inserts_are_not_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;
    let record = sample_record();

    let first = insert_history(&mut conn, &record, fixed_now()).await.unwrap();
    let second = insert_history(&mut conn, &record, fixed_now()).await.unwrap();

    assert_ne!(first, second);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM historial_cambio_material_imd")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_failed_history_insert_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;

    // Fails after the row reaches the table, inside the insert transaction
    sqlx::query(
        "CREATE TRIGGER reject_blocked_operator
         AFTER INSERT ON historial_cambio_material_imd
         WHEN NEW.persona = 'BLOCKED'
         BEGIN SELECT RAISE(ABORT, 'operator is blocked'); END",
    )
    .execute(&mut conn)
    .await
    .unwrap();

    let kept = insert_history(&mut conn, &sample_record(), fixed_now()).await.unwrap();

    let mut blocked = sample_record();
    blocked.operator = "BLOCKED".to_string();
    let err = insert_history(&mut conn, &blocked, fixed_now())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("operator is blocked"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM historial_cambio_material_imd")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // The connection stays usable and ids keep increasing
    let next = insert_history(&mut conn, &sample_record(), fixed_now()).await.unwrap();
    assert!(next > kept);
}

#[tokio::test]
async fn test_missing_history_row_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = migrated_store(&dir).await;
    assert!(fetch_history_record(&mut conn, 42).await.unwrap().is_none());
}
