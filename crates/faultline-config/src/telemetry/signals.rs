//! Per-signal overrides of the shared exporter

use serde::Deserialize;

use super::exporters::ExporterConfig;

/// `[telemetry.metrics]`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Export the error counters at all
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
}

/// `[telemetry.tracing]`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracingConfig {
    /// Fraction of root spans kept, `0.0..=1.0`
    #[serde(default = "sample_everything")]
    pub sampling_rate: f64,
    /// Follow the caller's sampling decision when a parent span exists
    #[serde(default = "enabled_by_default")]
    pub parent_based: bool,
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
}

#[allow(clippy::missing_const_for_fn)]
fn enabled_by_default() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn sample_everything() -> f64 {
    1.0
}
