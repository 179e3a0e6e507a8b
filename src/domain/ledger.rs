//! Named compounding equity curves (Total, per quarter, per year).

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use super::date_axis::DateAxis;

pub const TOTAL_BUCKET: &str = "Total";

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One compounding curve, seeded at 1.0 the session before its first day.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn new(seed_date: NaiveDate) -> Self {
        Self {
            points: vec![EquityPoint {
                date: seed_date,
                value: 1.0,
            }],
        }
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn last_value(&self) -> f64 {
        self.points.last().map(|p| p.value).unwrap_or(1.0)
    }

    /// Cumulative return since inception.
    pub fn gain(&self) -> f64 {
        self.last_value() - 1.0
    }

    /// Number of compounding steps recorded after the seed.
    pub fn days(&self) -> usize {
        self.points.len() - 1
    }

    fn push(&mut self, date: NaiveDate, daily_gain: f64) -> bool {
        if self.points.last().is_some_and(|p| p.date >= date) {
            return false;
        }
        let value = self.last_value() * (1.0 + daily_gain);
        self.points.push(EquityPoint { date, value });
        true
    }
}

/// Quarter and year bucket names for a sell date, e.g. `2021-Q2` and `2021`.
pub fn period_buckets(date: NaiveDate) -> (String, String) {
    let quarter = (date.month() - 1) / 3 + 1;
    (
        format!("{}-Q{}", date.year(), quarter),
        format!("{}", date.year()),
    )
}

/// All buckets a sell date contributes to.
pub fn buckets_for(date: NaiveDate) -> [String; 3] {
    let (quarter, year) = period_buckets(date);
    [TOTAL_BUCKET.to_string(), quarter, year]
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EquityLedger {
    curves: BTreeMap<String, EquityCurve>,
}

impl EquityLedger {
    /// Ledger whose Total curve is seeded at `total_seed`.
    pub fn new(total_seed: NaiveDate) -> Self {
        let mut curves = BTreeMap::new();
        curves.insert(TOTAL_BUCKET.to_string(), EquityCurve::new(total_seed));
        Self { curves }
    }

    /// Compounds `daily_gain` into `bucket` at `date`, creating the bucket at
    /// `(seed_date, 1.0)` on first use. Returns `false` and leaves the curve
    /// untouched when `date` does not advance it.
    pub fn record(
        &mut self,
        bucket: &str,
        date: NaiveDate,
        daily_gain: f64,
        seed_date: NaiveDate,
    ) -> bool {
        self.curves
            .entry(bucket.to_string())
            .or_insert_with(|| EquityCurve::new(seed_date))
            .push(date, daily_gain)
    }

    /// Records one simulated day into Total and the sell date's quarter and
    /// year buckets, all from the same gain.
    pub fn record_day(&mut self, date: NaiveDate, daily_gain: f64, axis: &DateAxis) {
        let seed = axis.seed_date(date);
        for bucket in buckets_for(date) {
            self.record(&bucket, date, daily_gain, seed);
        }
    }

    pub fn curve(&self, bucket: &str) -> Option<&EquityCurve> {
        self.curves.get(bucket)
    }

    pub fn final_gain(&self, bucket: &str) -> Option<f64> {
        self.curves.get(bucket).map(EquityCurve::gain)
    }

    /// Buckets in name order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &EquityCurve)> {
        self.curves.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `(bucket, final gain)` pairs sorted by bucket name.
    pub fn final_gains(&self) -> Vec<(String, f64)> {
        self.buckets()
            .map(|(name, curve)| (name.to_string(), curve.gain()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bucket_membership_from_sell_date() {
        let [total, quarter, year] = buckets_for(d(2021, 5, 17));
        assert_eq!(total, "Total");
        assert_eq!(quarter, "2021-Q2");
        assert_eq!(year, "2021");
        assert_eq!(period_buckets(d(2020, 1, 2)).0, "2020-Q1");
        assert_eq!(period_buckets(d(2020, 3, 31)).0, "2020-Q1");
        assert_eq!(period_buckets(d(2020, 10, 1)).0, "2020-Q4");
    }

    #[test]
    fn new_ledger_has_flat_total() {
        let ledger = EquityLedger::new(d(2021, 1, 4));
        assert_eq!(ledger.final_gain("Total"), Some(0.0));
        assert_eq!(ledger.curve("Total").unwrap().days(), 0);
    }

    #[test]
    fn record_compounds() {
        let mut ledger = EquityLedger::new(d(2021, 1, 4));
        ledger.record("Total", d(2021, 1, 5), 0.10, d(2021, 1, 4));
        ledger.record("Total", d(2021, 1, 6), -0.10, d(2021, 1, 4));
        assert_relative_eq!(ledger.final_gain("Total").unwrap(), 1.1 * 0.9 - 1.0);
    }

    #[test]
    fn record_rejects_non_advancing_date() {
        let mut ledger = EquityLedger::new(d(2021, 1, 4));
        assert!(ledger.record("Total", d(2021, 1, 5), 0.1, d(2021, 1, 4)));
        assert!(!ledger.record("Total", d(2021, 1, 5), 0.1, d(2021, 1, 4)));
        assert_eq!(ledger.curve("Total").unwrap().days(), 1);
    }

    #[test]
    fn record_day_creates_period_buckets_lazily() {
        let axis = DateAxis::new(vec![d(2021, 3, 30), d(2021, 3, 31), d(2021, 4, 1)]).unwrap();
        let mut ledger = EquityLedger::new(d(2021, 3, 30));
        ledger.record_day(d(2021, 3, 31), 0.02, &axis);
        ledger.record_day(d(2021, 4, 1), 0.01, &axis);

        let names: Vec<&str> = ledger.buckets().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["2021", "2021-Q1", "2021-Q2", "Total"]);

        let q2 = ledger.curve("2021-Q2").unwrap();
        assert_eq!(q2.points()[0].date, d(2021, 3, 31));
        assert_relative_eq!(q2.gain(), 0.01);
        assert_relative_eq!(ledger.final_gain("2021").unwrap(), 1.02 * 1.01 - 1.0);
        assert_relative_eq!(ledger.final_gain("Total").unwrap(), 1.02 * 1.01 - 1.0);
    }

    #[test]
    fn record_day_seeds_before_axis_start_with_business_day() {
        let axis = DateAxis::new(vec![d(2021, 1, 4)]).unwrap();
        let mut ledger = EquityLedger::new(d(2021, 1, 1));
        ledger.record_day(d(2021, 1, 4), 0.0, &axis);
        assert_eq!(ledger.curve("2021").unwrap().points()[0].date, d(2021, 1, 1));
    }

    #[test]
    fn final_gains_sorted_by_name() {
        let axis = DateAxis::new(vec![d(2020, 12, 31), d(2021, 1, 4)]).unwrap();
        let mut ledger = EquityLedger::new(d(2020, 12, 30));
        ledger.record_day(d(2020, 12, 31), 0.01, &axis);
        ledger.record_day(d(2021, 1, 4), 0.01, &axis);
        let names: Vec<String> = ledger.final_gains().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["2020", "2020-Q4", "2021", "2021-Q1", "Total"]);
    }

    proptest! {
        #[test]
        fn final_gain_follows_compounding_law(gains in prop::collection::vec(-0.5f64..0.5, 1..60)) {
            let start = d(2021, 1, 1);
            let mut ledger = EquityLedger::new(start);
            for (i, g) in gains.iter().enumerate() {
                ledger.record("Total", start + chrono::Duration::days(i as i64 + 1), *g, start);
            }
            let expected = gains.iter().fold(1.0, |acc, g| acc * (1.0 + g)) - 1.0;
            let actual = ledger.final_gain("Total").unwrap();
            prop_assert!((actual - expected).abs() < 1e-9);
        }

        #[test]
        fn identical_inputs_give_identical_ledgers(gains in prop::collection::vec(-0.2f64..0.2, 1..40)) {
            let build = || {
                let start = d(2021, 3, 1);
                let dates: Vec<NaiveDate> = (0..=gains.len() as i64)
                    .map(|i| start + chrono::Duration::days(i * 3))
                    .collect();
                let axis = DateAxis::new(dates.clone()).unwrap();
                let mut ledger = EquityLedger::new(start);
                for (date, g) in dates[1..].iter().zip(&gains) {
                    ledger.record_day(*date, *g, &axis);
                }
                ledger
            };
            prop_assert_eq!(build(), build());
        }
    }
}
