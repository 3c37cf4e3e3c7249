//! Configuration loading for the IMD material control service
//!
//! Configuration is resolved once at startup and passed explicitly to the
//! store connector and HTTP layer. Nothing reads ambient globals afterwards.
//!
//! # Sources
//!
//! 1. Command-line arguments / environment (applied by the binary via [`ConfigOverrides`])
//! 2. TOML bootstrap file
//! 3. Compiled defaults
//!
//! A missing TOML file is not fatal: a warning is logged and compiled
//! defaults are used. A present but invalid file aborts startup.

use crate::models::Machine;
use crate::{Error, Result};
use serde::Deserialize;
use sqlx::sqlite::SqliteConnectOptions;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Application name reported to clients
pub const APP_NAME: &str = "IMD Material Control";

/// Environment variable naming the TOML bootstrap file
pub const CONFIG_ENV_VAR: &str = "IMD_CONFIG";

/// Station entry used when the local station has no table of its own
pub const DEFAULT_STATION: &str = "DEFAULT";

/// Bootstrap configuration as written in the TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    /// Per-station settings keyed by station (host) name
    #[serde(default)]
    pub stations: BTreeMap<String, StationConfig>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, stdout only if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Store connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite busy timeout applied to every connection
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Connection profiles, primary first
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            profiles: Vec::new(),
        }
    }
}

/// One candidate store location as written in TOML
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProfileConfig {
    pub name: String,
    /// SQLite connection URL, e.g. `sqlite:///srv/imd/imd.db?mode=rw`
    pub url: String,
}

/// Workstation settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StationConfig {
    pub machine_default: String,

    #[serde(default)]
    pub line_default: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Command-line / environment overrides applied on top of the TOML file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub station: Option<String>,
}

/// Parsed, validated store profile ready for connecting
#[derive(Debug, Clone)]
pub struct ConnectionProfile {
    pub name: String,
    pub options: SqliteConnectOptions,
}

/// Resolved station identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationInfo {
    pub name: String,
    pub machine_default: Machine,
    pub line_default: Option<String>,
}

/// Complete resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub logging: LoggingConfig,
    pub profiles: Vec<ConnectionProfile>,
    pub station: StationInfo,
    /// File the configuration was read from, if any
    pub source: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the resolved TOML file and apply overrides
    ///
    /// Logging is usually not initialized yet when this runs, so messages
    /// about the source are logged again by the caller via [`AppConfig::source`].
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let path = resolve_config_path(overrides.config_path.as_deref());

        let (toml_config, source) = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                (parse_toml(&content)?, Some(path))
            }
            None => {
                warn!("No configuration file found, using compiled defaults");
                (TomlConfig::default(), None)
            }
        };

        let mut config = Self::from_toml(toml_config, &overrides)?;
        config.source = source;
        Ok(config)
    }

    /// Build the resolved configuration from parsed TOML
    pub fn from_toml(toml_config: TomlConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let busy_timeout = Duration::from_millis(toml_config.store.busy_timeout_ms);

        let profile_configs = if toml_config.store.profiles.is_empty() {
            vec![default_profile()]
        } else {
            toml_config.store.profiles
        };

        let profiles = profile_configs
            .into_iter()
            .map(|p| p.into_connection_profile(busy_timeout))
            .collect::<Result<Vec<_>>>()?;

        let station_name = overrides
            .station
            .clone()
            .or_else(local_station_name)
            .unwrap_or_else(|| DEFAULT_STATION.to_string())
            .to_uppercase();
        validate_stations(&toml_config.stations)?;
        let station = resolve_station(&station_name, &toml_config.stations)?;

        Ok(Self {
            host: overrides.host.clone().unwrap_or(toml_config.server.host),
            port: overrides.port.unwrap_or(toml_config.server.port),
            logging: toml_config.logging,
            profiles,
            station,
            source: None,
        })
    }
}

impl ProfileConfig {
    fn into_connection_profile(self, busy_timeout: Duration) -> Result<ConnectionProfile> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("Store profile name must not be empty".to_string()));
        }
        let options = SqliteConnectOptions::from_str(&self.url)
            .map_err(|e| {
                Error::Config(format!("Invalid URL for store profile '{}': {}", self.name, e))
            })?
            .busy_timeout(busy_timeout);

        Ok(ConnectionProfile {
            name: self.name,
            options,
        })
    }
}

/// Parse TOML bootstrap text
pub fn parse_toml(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
}

/// Locate the TOML bootstrap file
///
/// Priority: explicit path, then `IMD_CONFIG`, then the platform config
/// directory. An explicit path is returned even if it does not exist so the
/// read error reaches the operator.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("imd").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/imd/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent location of the default store file
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("imd").join("imd.db"))
        .unwrap_or_else(|| PathBuf::from("./imd_data/imd.db"))
}

fn default_profile() -> ProfileConfig {
    let path = default_database_path();
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Could not create data directory {}: {}", parent.display(), e);
        }
    }
    info!("Using default store at {}", path.display());
    ProfileConfig {
        name: "default".to_string(),
        url: format!("sqlite://{}?mode=rwc", path.display()),
    }
}

/// Station name from the host environment
fn local_station_name() -> Option<String> {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
}

fn machine_default_of(name: &str, station: &StationConfig) -> Result<Machine> {
    station.machine_default.parse::<Machine>().map_err(|_| {
        Error::Config(format!(
            "Station '{}' has invalid machine_default '{}'",
            name, station.machine_default
        ))
    })
}

/// Check every station entry, not only the one this host resolves to
pub fn validate_stations(stations: &BTreeMap<String, StationConfig>) -> Result<()> {
    for (name, station) in stations {
        machine_default_of(name, station)?;
    }
    Ok(())
}

/// Pick the station entry for `name`, falling back to `DEFAULT`, then AXIAL
pub fn resolve_station(
    name: &str,
    stations: &BTreeMap<String, StationConfig>,
) -> Result<StationInfo> {
    let entry = stations
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .or_else(|| {
            stations
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(DEFAULT_STATION))
        })
        .map(|(_, station)| station);

    let Some(station) = entry else {
        return Ok(StationInfo {
            name: name.to_string(),
            machine_default: Machine::Axial,
            line_default: None,
        });
    };

    let machine_default = machine_default_of(name, station)?;

    Ok(StationInfo {
        name: name.to_string(),
        machine_default,
        line_default: station
            .line_default
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_ascii_uppercase),
    })
}
