//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod feature_csv_adapter;
pub mod file_config_adapter;
pub mod file_report;
pub mod interrupt;
pub mod log_report;
