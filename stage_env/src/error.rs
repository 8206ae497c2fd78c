//! Error types for the Stage environment abstraction.

use thiserror::Error;

/// Errors that can occur while preparing the process environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A configuration value is present but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Host and port do not form a bindable socket address
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
}

impl EnvError {
    /// Creates an invalid-configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates an invalid-address error.
    pub fn address(addr: impl std::fmt::Display) -> Self {
        Self::InvalidAddress(addr.to_string())
    }
}
