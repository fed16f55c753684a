//! Domain error taxonomy.

/// Top-level error type for etfsig.
///
/// Signal evaluators and arbitrage detectors are locally guarded: any of
/// these errors downgrades the single check to "condition not satisfied"
/// with the error text folded into the reason. Only failures to load
/// authoritative state abort a cycle.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("{call} failed: {reason}")]
    Provider { call: String, reason: String },

    #[error("computation error: {reason}")]
    Computation { reason: String },

    #[error("state store error: {reason}")]
    Store { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StrategyError {
    pub fn provider(call: &str, reason: impl ToString) -> Self {
        StrategyError::Provider {
            call: call.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn store(reason: impl ToString) -> Self {
        StrategyError::Store {
            reason: reason.to_string(),
        }
    }
}

impl From<&StrategyError> for std::process::ExitCode {
    fn from(err: &StrategyError) -> Self {
        let code: u8 = match err {
            StrategyError::Io(_) => 1,
            StrategyError::ConfigParse { .. }
            | StrategyError::ConfigMissing { .. }
            | StrategyError::ConfigInvalid { .. } => 2,
            StrategyError::Store { .. } => 3,
            StrategyError::Provider { .. } => 4,
            StrategyError::InsufficientData { .. } | StrategyError::Computation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
