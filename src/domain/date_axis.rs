//! Ordered axis of market sessions bounding a simulation.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::error::SimError;

#[derive(Debug, Clone, PartialEq)]
pub struct DateAxis {
    dates: Vec<NaiveDate>,
}

impl DateAxis {
    /// Builds an axis from dates that must already be strictly ascending.
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, SimError> {
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SimError::data(format!(
                "date axis not strictly ascending at {} -> {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { dates })
    }

    /// Sorts and de-duplicates arbitrary dates into an axis.
    pub fn from_unsorted(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort();
        dates.dedup();
        Self { dates }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Resolves `[start, end]` into inclusive axis positions.
    ///
    /// `start_index` is the first session on or after `start`; `end_index` the
    /// last session on or before `end`. The session before `start_index` is the
    /// first buy day, so at least `lookback` sessions must precede it.
    pub fn resolve_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        lookback: usize,
    ) -> Result<(usize, usize), SimError> {
        let len = self.dates.len();
        let mut start_index = 0;
        while start_index < len && start > self.dates[start_index] {
            start_index += 1;
        }
        let mut end_index = len.saturating_sub(1);
        while end_index > 0 && end < self.dates[end_index] {
            end_index -= 1;
        }

        if start_index == 0 || start_index - 1 < lookback {
            return Err(SimError::InsufficientHistory {
                start: start.to_string(),
                lookback,
                available: start_index.saturating_sub(1),
            });
        }
        Ok((start_index, end_index))
    }

    /// Latest axis date strictly before `date`.
    pub fn previous_market_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let p = self.dates.partition_point(|d| *d < date);
        p.checked_sub(1).map(|i| self.dates[i])
    }

    /// Date a compounding curve starting at `date` is seeded with: the
    /// previous session, or the previous weekday when `date` opens the axis.
    pub fn seed_date(&self, date: NaiveDate) -> NaiveDate {
        self.previous_market_date(date)
            .unwrap_or_else(|| previous_business_day(date))
    }
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First weekday strictly after `date`.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut d = date + Duration::days(1);
    while !is_business_day(d) {
        d += Duration::days(1);
    }
    d
}

/// Last weekday strictly before `date`.
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut d = date - Duration::days(1);
    while !is_business_day(d) {
        d -= Duration::days(1);
    }
    d
}
