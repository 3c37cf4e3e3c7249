//! Part lookup and scan validation endpoints
//!
//! All three endpoints are reads against the reference table. A missing
//! reference row is reported as `not_found`, which clients treat differently
//! from a scan that was checked and rejected (`is_valid: false`).

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use imd_common::db::find_reference_entry;
use imd_common::{parse_part_number, ReferenceEntry, ReferenceKey};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{release, ApiError, ApiResult};
use crate::validation::{feeder_matches, polarity_matches};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchPartRequest {
    #[serde(default)]
    pub qr_almacen: String,
    #[serde(default)]
    pub machine: String,
    #[serde(default)]
    pub line: String,
}

#[derive(Debug, Serialize)]
pub struct SearchPartResponse {
    pub success: bool,
    /// Part number parsed from the scanned code
    pub part_number: String,
    pub data: PartData,
}

/// Reference values for the scanned part
#[derive(Debug, Serialize)]
pub struct PartData {
    pub numero_de_parte: String,
    pub spec: String,
    pub feeder: String,
    /// `<MACHINE>_<feeder>`
    pub posicion_de_feeder: String,
    pub polarity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateFeederRequest {
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub feeder_scanned: String,
    #[serde(default)]
    pub machine: String,
    #[serde(default)]
    pub line: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateFeederResponse {
    pub success: bool,
    pub is_valid: bool,
    pub expected_feeder: String,
    pub scanned_feeder: String,
    pub expected_polarity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidatePolarityRequest {
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub polarity_scanned: String,
    #[serde(default)]
    pub machine: String,
    #[serde(default)]
    pub line: String,
}

#[derive(Debug, Serialize)]
pub struct ValidatePolarityResponse {
    pub success: bool,
    pub is_valid: bool,
    pub expected_polarity: Option<String>,
    pub scanned_polarity: String,
}

fn required<'a>(field: &str, value: &'a str) -> ApiResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value)
}

/// Fetch the reference row for `key` on a fresh connection
async fn lookup(state: &AppState, key: &ReferenceKey) -> ApiResult<Option<ReferenceEntry>> {
    let mut conn = state.store.acquire().await?;
    let entry = find_reference_entry(&mut conn, key).await?;
    release(conn).await;
    Ok(entry)
}

fn not_found(what: &str, key: &ReferenceKey) -> ApiError {
    ApiError::NotFound(format!(
        "{} not found for part {} on {} line {}",
        what, key.part_number, key.machine, key.line
    ))
}

/// POST /api/search-part
///
/// Parses the part number out of the warehouse QR code and returns the
/// reference values for it on the given machine and line.
pub async fn search_part(
    State(state): State<AppState>,
    payload: Result<Json<SearchPartRequest>, JsonRejection>,
) -> ApiResult<Json<SearchPartResponse>> {
    let Json(req) = payload?;

    let qr = required("qr_almacen", &req.qr_almacen)?;
    let part_number = parse_part_number(qr)?.trim();
    let key = ReferenceKey::new(part_number, &req.machine, &req.line)?;

    let entry = lookup(&state, &key)
        .await?
        .ok_or_else(|| not_found("Part number", &key))?;

    info!(
        "search-part: {} -> {} on {} {}",
        qr,
        entry.feeder_position(),
        key.machine,
        key.line
    );

    Ok(Json(SearchPartResponse {
        success: true,
        part_number: key.part_number.clone(),
        data: PartData {
            posicion_de_feeder: entry.feeder_position(),
            numero_de_parte: entry.part_number,
            spec: entry.spec,
            feeder: entry.feeder,
            polarity: entry.polarity,
        },
    }))
}

/// POST /api/validate-feeder
pub async fn validate_feeder(
    State(state): State<AppState>,
    payload: Result<Json<ValidateFeederRequest>, JsonRejection>,
) -> ApiResult<Json<ValidateFeederResponse>> {
    let Json(req) = payload?;

    let scanned = required("feeder_scanned", &req.feeder_scanned)?;
    let key = ReferenceKey::new(&req.part_number, &req.machine, &req.line)?;

    let entry = lookup(&state, &key)
        .await?
        .ok_or_else(|| not_found("Feeder configuration", &key))?;

    let is_valid = feeder_matches(&entry.feeder, scanned);
    info!(
        "validate-feeder: part {} expected {} scanned {} -> {}",
        key.part_number,
        entry.feeder,
        scanned,
        if is_valid { "OK" } else { "MISMATCH" }
    );

    Ok(Json(ValidateFeederResponse {
        success: true,
        is_valid,
        expected_feeder: entry.feeder,
        scanned_feeder: scanned.to_string(),
        expected_polarity: entry.polarity,
    }))
}

/// POST /api/validate-polarity
///
/// A reference row without polarity accepts any scanned value.
pub async fn validate_polarity(
    State(state): State<AppState>,
    payload: Result<Json<ValidatePolarityRequest>, JsonRejection>,
) -> ApiResult<Json<ValidatePolarityResponse>> {
    let Json(req) = payload?;

    let scanned = required("polarity_scanned", &req.polarity_scanned)?;
    let key = ReferenceKey::new(&req.part_number, &req.machine, &req.line)?;

    let entry = lookup(&state, &key)
        .await?
        .ok_or_else(|| not_found("Polarity configuration", &key))?;

    let is_valid = polarity_matches(entry.polarity.as_deref(), scanned);
    info!(
        "validate-polarity: part {} expected {:?} scanned {} -> {}",
        key.part_number,
        entry.polarity,
        scanned,
        if is_valid { "OK" } else { "MISMATCH" }
    );

    Ok(Json(ValidatePolarityResponse {
        success: true,
        is_valid,
        expected_polarity: entry.polarity,
        scanned_polarity: scanned.to_string(),
    }))
}
