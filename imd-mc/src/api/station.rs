//! Workstation identity endpoint
//!
//! Lets the scan client preselect the machine (and line, when configured)
//! for the station it runs on.

use axum::{extract::State, Json};
use imd_common::config::APP_NAME;
use imd_common::Machine;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StationResponse {
    pub station: String,
    pub machine_default: Machine,
    pub line_default: Option<String>,
    pub app_name: String,
    pub version: String,
}

/// GET /api/station
pub async fn station_info(State(state): State<AppState>) -> Json<StationResponse> {
    Json(StationResponse {
        station: state.station.name.clone(),
        machine_default: state.station.machine_default,
        line_default: state.station.line_default.clone(),
        app_name: APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
