//! CLI error types.

use mart_market::MarketError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// The marketplace rejected the operation.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Wrap a malformed amount argument.
    pub fn invalid_amount(arg: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{arg}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mart_market::OrderId;

    #[test]
    fn market_errors_pass_through() {
        let err = CliError::from(MarketError::OrderNotFound(OrderId::new(7)));
        assert_eq!(err.to_string(), "order not found: 7");
    }

    #[test]
    fn display_invalid_argument() {
        let err = CliError::invalid_amount("--usd", "invalid number");
        assert_eq!(err.to_string(), "invalid argument: --usd: invalid number");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
