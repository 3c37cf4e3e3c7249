//! Material change history endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Local;
use imd_common::db::insert_history;
use imd_common::NewHistoryRecord;
use serde::Serialize;
use tracing::info;

use super::{release, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SaveHistoryResponse {
    pub success: bool,
    pub record_id: i64,
    pub message: String,
}

/// POST /api/save-history
///
/// Appends one confirmed change. Required fields are checked before the
/// store is touched. Resubmitting the same payload creates another row.
pub async fn save_history(
    State(state): State<AppState>,
    payload: Result<Json<NewHistoryRecord>, JsonRejection>,
) -> ApiResult<Json<SaveHistoryResponse>> {
    let Json(record) = payload?;
    record.validate()?;

    let mut conn = state.store.acquire().await?;
    let record_id = insert_history(&mut conn, &record, Local::now().naive_local()).await?;
    release(conn).await;

    info!(
        "save-history: record {} ({} {} by {})",
        record_id, record.feeder_position, record.part_number, record.operator
    );

    Ok(Json(SaveHistoryResponse {
        success: true,
        record_id,
        message: "Record saved".to_string(),
    }))
}
