//! Port traits at the boundary between the simulation engine and the outside world.

pub mod config_port;
pub mod data_port;
pub mod export_port;
pub mod report_port;
pub mod scoring_port;
