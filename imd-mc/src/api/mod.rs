//! HTTP API handlers for imd-mc

pub mod error;
pub mod health;
pub mod history;
pub mod parts;
pub mod station;

pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use history::save_history;
pub use parts::{search_part, validate_feeder, validate_polarity};
pub use station::station_info;

use sqlx::{Connection, SqliteConnection};
use tracing::warn;

/// Close a request-scoped store connection
///
/// Error paths simply drop the connection, which also closes it.
async fn release(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close store connection: {}", e);
    }
}
