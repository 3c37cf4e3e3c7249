//! imd-mc library - IMD material control validation service
//!
//! Stateless HTTP/JSON handlers that check scanned feeder positions and
//! polarity against the reference table and append confirmed changes to the
//! history table. Each request opens and drops its own store connection.

use axum::Router;
use imd_common::config::StationInfo;
use imd_common::db::StoreConnector;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod validation;

/// Application state shared across HTTP handlers
///
/// Holds configuration resolved at startup. The only state requests touch is
/// the connector's per-profile "schema ready" marker.
#[derive(Clone)]
pub struct AppState {
    /// Store connector (ordered profiles, one connection per request)
    pub store: Arc<StoreConnector>,
    /// Identity of the workstation this service runs on
    pub station: Arc<StationInfo>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: StoreConnector, station: StationInfo) -> Self {
        Self {
            store: Arc::new(store),
            station: Arc::new(station),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/search-part", post(api::search_part))
        .route("/api/validate-feeder", post(api::validate_feeder))
        .route("/api/validate-polarity", post(api::validate_polarity))
        .route("/api/save-history", post(api::save_history))
        .route("/api/station", get(api::station_info));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
