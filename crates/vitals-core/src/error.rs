//! Error types for the vitals metrics library
//!
//! The core is largely total: missing lookups return `Option`, statistical
//! degeneracies are normalized to zero, and out-of-order rate updates are
//! silently discarded. Errors are reserved for the two cases where a caller
//! handed us something we cannot honor:
//!
//! - **AlreadyRegistered**: a registry name collision at registration time.
//! - **InvalidConfiguration**: a mismatched options bag passed to a metric's
//!   process entry point, or an otherwise unusable configuration.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.

use thiserror::Error;

/// Result type alias for vitals operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the vitals metrics library
#[derive(Debug, Error)]
pub enum Error {
    /// A metric with the same qualified name already exists in the registry
    #[error("metric already registered: {name}")]
    AlreadyRegistered {
        /// The qualified name that collided
        name: String,
    },

    /// A metric was driven with options meant for a different metric kind,
    /// or with parameters it cannot honor
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// What went wrong
        message: String,
    },
}

impl Error {
    /// Create an AlreadyRegistered error
    pub fn already_registered(name: impl Into<String>) -> Self {
        Error::AlreadyRegistered { name: name.into() }
    }

    /// Create an InvalidConfiguration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Check if this error is a registration collision
    pub fn is_already_registered(&self) -> bool {
        matches!(self, Error::AlreadyRegistered { .. })
    }

    /// Check if this error is a configuration mismatch
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Error::InvalidConfiguration { .. })
    }
}
