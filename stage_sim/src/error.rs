//! Error types for the Stage harness and server.

use stage_env::EnvError;
use thiserror::Error;

/// Errors surfaced by the harness, the exporter and the server.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration could not be turned into a listen address
    #[error(transparent)]
    Env(#[from] EnvError),

    /// Socket or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Export serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
