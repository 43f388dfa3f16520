//! Error taxonomy for KPI queries.
//!
//! Only structural failures are errors: a bad window, a missing parent
//! entity, or a store that cannot be read. Absent metric fields and zero
//! denominators are never errors; every formula resolves them to `0` (or to
//! the documented status fallback) instead.

use thiserror::Error;

/// Failure signal of a KPI query.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The window is valid but no machine, device, or sample matched the keys.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or inverted time window, or an unusable identifier/config.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The telemetry store or machine catalog is unreachable or erroring.
    #[error("transient failure: {0}")]
    TransientFailure(String),
}

impl EngineError {
    /// Short machine-readable kind, used in logs and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::TransientFailure(_) => "transient_failure",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::TransientFailure(format!("store I/O: {err}"))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::TransientFailure(format!("store decode: {err}"))
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidInput(format!("config: {err}"))
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(EngineError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(EngineError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(
            EngineError::TransientFailure("x".into()).kind(),
            "transient_failure"
        );
    }

    #[test]
    fn test_io_error_is_transient() {
        let err: EngineError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, EngineError::TransientFailure(_)));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_toml_error_is_invalid_input() {
        let err: EngineError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
