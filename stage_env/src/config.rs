//! Process configuration for the Stage metrics mock.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};

/// Values the surrounding process hands to the metrics engine.
///
/// The binary fills this from command-line flags with environment-variable
/// fallbacks; the engine only ever sees `initial_scenario`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Interface to bind the HTTP surface to
    pub host: String,

    /// TCP port for the HTTP surface
    pub port: u16,

    /// Whether the mock Prometheus routes are mounted at all
    pub prometheus_enabled: bool,

    /// Scenario active at process start. Unknown names fall back to healthy.
    pub initial_scenario: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            prometheus_enabled: true,
            initial_scenario: "healthy".to_string(),
        }
    }
}

impl StageConfig {
    /// Checks that the configuration can be used to start a server.
    pub fn validate(&self) -> Result<(), EnvError> {
        if self.host.trim().is_empty() {
            return Err(EnvError::config("HOST cannot be empty"));
        }
        if self.port == 0 {
            return Err(EnvError::config(
                "PORT must be a number between 1 and 65535, got: 0",
            ));
        }
        Ok(())
    }

    /// Resolves `host:port` to the first matching socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, EnvError> {
        self.validate()?;
        let addr = format!("{}:{}", self.host, self.port);
        addr.to_socket_addrs()
            .map_err(|_| EnvError::address(&addr))?
            .next()
            .ok_or_else(|| EnvError::address(&addr))
    }
}
