//! # IMD Common Library
//!
//! Shared code for the IMD material control service:
//! - Configuration loading (TOML bootstrap, store profiles, stations)
//! - Data model for reference entries and history records
//! - Part code parsing for scanned warehouse QR codes
//! - Store access with profile fallback and schema migrations

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod part_code;

pub use error::{Error, Result, StoreUnavailable};
pub use models::{HistoryRecord, Machine, NewHistoryRecord, ReferenceEntry, ReferenceKey};
pub use part_code::parse_part_number;
