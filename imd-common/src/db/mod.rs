//! Store access: connection fallback, schema, reference lookup, history insert

pub mod connect;
pub mod history;
pub mod init;
pub mod migrations;
pub mod reference;

pub use connect::StoreConnector;
pub use history::{fetch_history_record, insert_history};
pub use migrations::run_migrations;
pub use reference::find_reference_entry;
