//! Core domain types and logic.

pub mod allocation;
pub mod config_validation;
pub mod date_axis;
pub mod error;
pub mod features;
pub mod ledger;
pub mod ohlcv;
pub mod report;
pub mod scoring;
pub mod series_store;
pub mod simulation;
pub mod trade_record;
