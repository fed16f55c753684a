//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod console_notify_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "sqlite")]
pub mod csv_import;
