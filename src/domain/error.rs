//! Domain error types.

/// Top-level error type for dailysim.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("start date {start} needs {lookback} sessions of look-back, only {available} available")]
    InsufficientHistory {
        start: String,
        lookback: usize,
        available: usize,
    },

    #[error("invalid replay file {file}: {reason}")]
    ReplaySchema { file: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data for any symbol")]
    NoData,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn data(reason: impl Into<String>) -> Self {
        SimError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&SimError> for std::process::ExitCode {
    fn from(err: &SimError) -> Self {
        let code: u8 = match err {
            SimError::Io(_) | SimError::Csv(_) => 1,
            SimError::ConfigParse { .. }
            | SimError::ConfigMissing { .. }
            | SimError::ConfigInvalid { .. }
            | SimError::InsufficientHistory { .. }
            | SimError::ReplaySchema { .. } => 2,
            SimError::Data { .. } => 3,
            SimError::NoData => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_message_names_the_numbers() {
        let err = SimError::InsufficientHistory {
            start: "2021-01-05".into(),
            lookback: 252,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("2021-01-05"));
        assert!(msg.contains("252"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn data_helper_builds_data_variant() {
        let err = SimError::data("bad row");
        assert!(matches!(err, SimError::Data { ref reason } if reason == "bad row"));
    }
}
