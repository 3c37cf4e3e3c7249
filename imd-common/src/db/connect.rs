//! Per-request store connections with ordered profile fallback
//!
//! Every operation opens its own connection and drops it when done; there is
//! no pool. Profiles are tried in configured order and the first one that
//! connects wins. No retry or backoff happens within a profile.
//!
//! The first successful connection to each profile also brings that store's
//! schema up to date, so a fallback store is usable the first time it is hit.

use crate::config::ConnectionProfile;
use crate::db::migrations::run_migrations;
use crate::{Error, Result, StoreUnavailable};
use sqlx::{ConnectOptions, SqliteConnection};
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

/// Opens store connections against an ordered list of profiles
#[derive(Debug)]
pub struct StoreConnector {
    profiles: Vec<ConnectionProfile>,
    /// One cell per profile, set once its migrations have succeeded
    schema_ready: Vec<OnceCell<()>>,
}

impl StoreConnector {
    /// Create a connector; the first profile is the primary
    pub fn new(profiles: Vec<ConnectionProfile>) -> Result<Self> {
        if profiles.is_empty() {
            return Err(Error::Config(
                "At least one store profile is required".to_string(),
            ));
        }
        let schema_ready = profiles.iter().map(|_| OnceCell::new()).collect();
        Ok(Self {
            profiles,
            schema_ready,
        })
    }

    pub fn profiles(&self) -> &[ConnectionProfile] {
        &self.profiles
    }

    /// Connect using the first reachable profile
    ///
    /// A profile whose migrations fail counts as failed and the next one is
    /// tried. Returns [`StoreUnavailable`] carrying the last error when every
    /// profile fails.
    pub async fn acquire(&self) -> std::result::Result<SqliteConnection, StoreUnavailable> {
        let total = self.profiles.len();
        let mut last_failure: Option<(String, String)> = None;

        for (idx, profile) in self.profiles.iter().enumerate() {
            debug!(
                "Connecting to store (profile {}/{} '{}')",
                idx + 1,
                total,
                profile.name
            );

            match self.open(idx).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!(
                        "Store profile {}/{} '{}' failed: {}",
                        idx + 1,
                        total,
                        profile.name,
                        e
                    );
                    last_failure = Some((profile.name.clone(), e.to_string()));
                }
            }
        }

        let (last_profile, last_error) = last_failure.unwrap_or_default();
        error!(
            "No store profile reachable after {} attempt(s); last error: {}",
            total, last_error
        );
        Err(StoreUnavailable {
            attempted: total,
            last_profile,
            last_error,
        })
    }

    async fn open(&self, idx: usize) -> Result<SqliteConnection> {
        let mut conn = self.profiles[idx].options.connect().await?;
        let migrating = &mut conn;
        self.schema_ready[idx]
            .get_or_try_init(move || run_migrations(migrating))
            .await?;
        Ok(conn)
    }
}
