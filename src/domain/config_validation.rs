//! Configuration validation.
//!
//! Validates the `[data]`, `[simulate]` and `[report]` sections before any
//! price is loaded.

use crate::domain::error::SimError;
use crate::domain::features::MlFeatures;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// At most this many benchmark overlays fit on a chart.
pub const MAX_BENCHMARKS: usize = 3;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), SimError> {
    validate_dates(config)?;
    validate_lookback(config)?;
    validate_max_positions(config)?;
    validate_min_score(config)?;
    validate_history_years(config)?;
    validate_benchmarks(config)?;
    Ok(())
}

/// Parses an optional `YYYY-MM-DD` value; absent or blank yields `None`.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, SimError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => parse_date(s.trim(), section, key).map(Some),
        _ => Ok(None),
    }
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, SimError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| SimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("invalid {} format, expected YYYY-MM-DD", key),
    })
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SimError> {
    let start = parse_optional_date(config, "simulate", "start_date")?;
    let end = parse_optional_date(config, "simulate", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(SimError::ConfigInvalid {
                section: "simulate".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), SimError> {
    lookback_days(config).map(|_| ())
}

/// Resolved `[simulate] lookback_days`. Feature computation needs a full
/// year of sessions, so anything shorter is rejected.
pub fn lookback_days(config: &dyn ConfigPort) -> Result<usize, SimError> {
    let value = config.get_int("simulate", "lookback_days", MlFeatures::LOOKBACK as i64);
    match usize::try_from(value) {
        Ok(v) if v >= MlFeatures::LOOKBACK => Ok(v),
        _ => Err(SimError::ConfigInvalid {
            section: "simulate".to_string(),
            key: "lookback_days".to_string(),
            reason: format!(
                "lookback_days must be at least {} sessions, got {}",
                MlFeatures::LOOKBACK,
                value
            ),
        }),
    }
}

fn validate_max_positions(config: &dyn ConfigPort) -> Result<(), SimError> {
    let value = config.get_int("simulate", "max_positions", 1);
    if value < 1 {
        return Err(SimError::ConfigInvalid {
            section: "simulate".to_string(),
            key: "max_positions".to_string(),
            reason: "max_positions must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_min_score(config: &dyn ConfigPort) -> Result<(), SimError> {
    let value = config.get_double("simulate", "min_score", 0.0);
    if value.is_nan() || value < 0.0 {
        return Err(SimError::ConfigInvalid {
            section: "simulate".to_string(),
            key: "min_score".to_string(),
            reason: "min_score must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_history_years(config: &dyn ConfigPort) -> Result<(), SimError> {
    let value = config.get_int("data", "history_years", 1);
    if value < 1 {
        return Err(SimError::ConfigInvalid {
            section: "data".to_string(),
            key: "history_years".to_string(),
            reason: "history_years must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_benchmarks(config: &dyn ConfigPort) -> Result<(), SimError> {
    let benchmarks = config.get_list("report", "benchmarks");
    if benchmarks.len() > MAX_BENCHMARKS {
        return Err(SimError::ConfigInvalid {
            section: "report".to_string(),
            key: "benchmarks".to_string(),
            reason: format!("at most {} benchmarks are supported", MAX_BENCHMARKS),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[data]
prices_dir = data/prices
history_years = 3

[simulate]
start_date = 2021-01-04
end_date = 2021-12-31
lookback_days = 252
max_positions = 5
allow_short = false
min_score = 0.0

[report]
benchmarks = QQQ,SPY,TQQQ
"#,
        );
        assert!(validate_simulation_config(&config).is_ok());
    }

    #[test]
    fn empty_config_passes() {
        assert!(validate_simulation_config(&make_config("")).is_ok());
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[simulate]\nstart_date = 2021/01/04\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[simulate]\nstart_date = 2021-12-31\nend_date = 2021-01-04\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn single_day_window_passes() {
        let config = make_config("[simulate]\nstart_date = 2021-01-04\nend_date = 2021-01-04\n");
        assert!(validate_simulation_config(&config).is_ok());
    }

    #[test]
    fn negative_lookback_fails() {
        let config = make_config("[simulate]\nlookback_days = -1\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "lookback_days"));
    }

    #[test]
    fn lookback_shorter_than_feature_history_fails() {
        let config = make_config("[simulate]\nlookback_days = 5\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "lookback_days"));
    }

    #[test]
    fn lookback_defaults_to_feature_history() {
        assert_eq!(lookback_days(&make_config("")).unwrap(), MlFeatures::LOOKBACK);
        let config = make_config("[simulate]\nlookback_days = 300\n");
        assert_eq!(lookback_days(&config).unwrap(), 300);
    }

    #[test]
    fn max_positions_zero_fails() {
        let config = make_config("[simulate]\nmax_positions = 0\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "max_positions"));
    }

    #[test]
    fn negative_min_score_fails() {
        let config = make_config("[simulate]\nmin_score = -0.5\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "min_score"));
    }

    #[test]
    fn history_years_zero_fails() {
        let config = make_config("[data]\nhistory_years = 0\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "history_years"));
    }

    #[test]
    fn too_many_benchmarks_fails() {
        let config = make_config("[report]\nbenchmarks = QQQ,SPY,TQQQ,DIA\n");
        let err = validate_simulation_config(&config).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "benchmarks"));
    }

    #[test]
    fn parse_optional_date_blank_is_none() {
        let config = make_config("[simulate]\nstart_date =\n");
        assert_eq!(parse_optional_date(&config, "simulate", "start_date").unwrap(), None);
        assert_eq!(parse_optional_date(&config, "simulate", "end_date").unwrap(), None);
    }
}
