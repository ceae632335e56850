//! Error types for the keyward custodian.
//!
//! Errors are organized by domain:
//!
//! - [`HsmError`] - Controller request failures
//! - [`StoreError`] - Persistent state-blob failures
//! - [`ConfigError`] - Configuration failures
//! - [`KeywardError`] - Top-level error that wraps all error types
//!
//! # The uniform rejection
//!
//! The controller deliberately reports every refusable condition as the
//! single [`HsmError::Rejected`] value: a request refused by the state
//! machine, a consent timeout, and a mask that fails the key-pair self-test
//! are indistinguishable to the caller. Distinguishing them would leak
//! which guard fired. Only fatal faults (persistence I/O) surface as a
//! separate variant, and those abort the operation before any state change.
//!
//! # Example
//!
//! ```rust
//! use keyward_core::error::{HsmError, KeywardError};
//!
//! fn check(admissible: bool) -> Result<(), KeywardError> {
//!     if !admissible {
//!         return Err(HsmError::Rejected.into());
//!     }
//!     Ok(())
//! }
//! ```

/// Top-level error type for the keyward workspace.
///
/// Wraps all domain-specific error types and provides automatic conversion
/// via the `#[from]` attribute.
#[derive(Debug, thiserror::Error)]
pub enum KeywardError {
    /// A controller request failed.
    #[error("HSM error: {0}")]
    Hsm(#[from] HsmError),

    /// A persistent-store operation failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ============================================================================
// HsmError
// ============================================================================

/// Errors surfaced by the HSM controller.
///
/// Per the custody model, callers see exactly one refusal value. The
/// controller does not report *why* a request was refused.
#[derive(Debug, thiserror::Error)]
pub enum HsmError {
    /// The request was refused.
    ///
    /// Covers a request disallowed in the current state, a consent timeout,
    /// a mask that failed the key-pair self-test, and any violated internal
    /// invariant. The caller can infer the controller's state only from
    /// which operations subsequently succeed.
    #[error("request rejected")]
    Rejected,

    /// The persistent store failed.
    ///
    /// Fatal: the operation aborted before any state change, and the
    /// on-disk blob was not touched.
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl HsmError {
    /// Whether this error is the uniform rejection (as opposed to a fatal
    /// storage fault).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

// ============================================================================
// StoreError
// ============================================================================

/// Errors from the persistent state-blob store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Insufficient file system permissions.
    #[error("permission denied")]
    PermissionDenied,
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(error),
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {context}")]
    ParseFailed {
        /// Context about the parsing failure.
        context: String,
    },

    /// A configuration value is invalid.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// The field name with the invalid value.
        field: String,
        /// The invalid value.
        value: String,
    },
}

impl ConfigError {
    /// Create a `FileNotFound` error.
    #[must_use]
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a `ParseFailed` error.
    #[must_use]
    pub fn parse_failed(context: impl Into<String>) -> Self {
        Self::ParseFailed {
            context: context.into(),
        }
    }

    /// Create an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Result type aliases
// ============================================================================

/// A `Result` type alias using [`KeywardError`] as the error type.
pub type Result<T> = std::result::Result<T, KeywardError>;

/// A `Result` type alias for controller operations.
pub type HsmResult<T> = std::result::Result<T, HsmError>;

/// A `Result` type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A `Result` type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyward_error_from_hsm_error() {
        let err: KeywardError = HsmError::Rejected.into();
        assert!(matches!(err, KeywardError::Hsm(HsmError::Rejected)));
        assert_eq!(err.to_string(), "HSM error: request rejected");
    }

    #[test]
    fn test_keyward_error_from_store_error() {
        let err: KeywardError = StoreError::PermissionDenied.into();
        assert!(matches!(
            err,
            KeywardError::Store(StoreError::PermissionDenied)
        ));
        assert_eq!(err.to_string(), "Storage error: permission denied");
    }

    #[test]
    fn test_hsm_error_wraps_store_error() {
        let io = std::io::Error::other("disk gone");
        let err = HsmError::from(StoreError::from(io));
        assert!(!err.is_rejection());
        assert_eq!(err.to_string(), "storage failure: I/O error: disk gone");
    }

    #[test]
    fn test_rejection_is_uniform() {
        // One variant covers every refusal; its message carries no cause.
        let err = HsmError::Rejected;
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "request rejected");
    }

    #[test]
    fn test_store_error_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::PermissionDenied));

        let io = std::io::Error::other("something else");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::file_not_found("/etc/keyward.toml").to_string(),
            "configuration file not found: /etc/keyward.toml"
        );
        assert_eq!(
            ConfigError::parse_failed("bad TOML").to_string(),
            "failed to parse configuration: bad TOML"
        );
        assert_eq!(
            ConfigError::invalid_value("consent_timeout_ms", "0").to_string(),
            "invalid value for consent_timeout_ms: 0"
        );
    }

    #[test]
    fn test_store_error_source_chain() {
        use std::error::Error;
        let err = StoreError::Io(std::io::Error::other("inner"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeywardError>();
        assert_send_sync::<HsmError>();
        assert_send_sync::<StoreError>();
        assert_send_sync::<ConfigError>();
    }
}
