#![allow(clippy::must_use_candidate)]

mod env;
pub mod health;
mod loader;
pub mod server;
pub mod supervisor;
pub mod telemetry;

use serde::Deserialize;

pub use health::*;
pub use server::*;
pub use supervisor::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Faultline configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Fatal-path supervisor configuration
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
