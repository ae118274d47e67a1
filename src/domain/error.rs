//! Domain error types.

/// Top-level error type for tradebench.
///
/// The first six variants are the failure kinds of the backtest pipeline
/// itself; the rest cover configuration and storage plumbing.
#[derive(Debug, thiserror::Error)]
pub enum TradebenchError {
    #[error("could not parse series: {reason}")]
    Format { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("{entity} '{name}' already exists")]
    AlreadyExists { entity: &'static str, name: String },

    #[error("{entity} '{name}' not found")]
    NotFound { entity: &'static str, name: String },

    #[error("strategy contract violation: {reason}")]
    ContractViolation { reason: String },

    #[error("strategy execution failed: {reason}")]
    StrategyExecution { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradebenchError> for std::process::ExitCode {
    fn from(err: &TradebenchError) -> Self {
        let code: u8 = match err {
            TradebenchError::Io(_) => 1,
            TradebenchError::ConfigParse { .. } | TradebenchError::ConfigMissing { .. } => 2,
            TradebenchError::Database { .. } | TradebenchError::DatabaseQuery { .. } => 3,
            TradebenchError::Format { .. } | TradebenchError::InvalidInput { .. } => 4,
            TradebenchError::AlreadyExists { .. } | TradebenchError::NotFound { .. } => 5,
            TradebenchError::ContractViolation { .. }
            | TradebenchError::StrategyExecution { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
