//! Market-data access port trait.

use crate::domain::error::SimError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Provider of daily price history. Calls are blocking and are all made
/// before the simulation loop starts.
pub trait DataPort {
    /// Bars for `symbol` with `start_date <= date <= end_date`, ascending.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SimError>;

    fn list_symbols(&self) -> Result<Vec<String>, SimError>;
}
