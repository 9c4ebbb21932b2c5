//! Crate-level error type
//!
//! The scoring and planning functions are total and never fail; errors only
//! come from reading snapshots and loading configuration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_converts() {
        let err: EngineError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, EngineError::Snapshot(_)));
        assert!(err.to_string().starts_with("snapshot error"));
    }

    #[test]
    fn test_invalid_config_message() {
        let err = EngineError::InvalidConfig("targetRetention out of range".into());
        assert_eq!(err.to_string(), "invalid config: targetRetention out of range");
    }
}
