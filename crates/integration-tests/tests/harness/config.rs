//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use faultline_config::{Config, HealthConfig, ServerConfig, SupervisorConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                },
                supervisor: SupervisorConfig {
                    abort_delay: "30s".to_owned(),
                    exit_code: 1,
                },
                telemetry: None,
            },
        }
    }

    /// Restrict the health route to the given methods
    pub fn with_health_methods(mut self, methods: &[&str]) -> Self {
        self.config.server.health.methods = methods.iter().map(|m| (*m).to_owned()).collect();
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Set the supervisor's forced-abort delay
    pub fn with_abort_delay(mut self, delay: &str) -> Self {
        self.config.supervisor.abort_delay = delay.to_owned();
        self
    }

    /// Set the exit code used for fatal failures
    pub fn with_exit_code(mut self, code: u8) -> Self {
        self.config.supervisor.exit_code = code;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
