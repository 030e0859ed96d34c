//! Error types shared by the fair value crates.

use thiserror::Error;

/// Result type alias using the common error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the service boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found (unknown ticker, missing snapshot)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream data source error
    #[error("Data source error: {0}")]
    External(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::External(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::NotFound("AAPL".into()).status_code(), 404);
        assert_eq!(Error::InvalidInput("wacc".into()).status_code(), 400);
        assert_eq!(Error::External("timeout".into()).status_code(), 502);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("ticker MSFT".into());
        assert_eq!(err.to_string(), "Not found: ticker MSFT");
    }
}
