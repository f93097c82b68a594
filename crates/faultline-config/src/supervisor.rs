use std::time::Duration;

use serde::Deserialize;

/// Fatal-path supervisor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    /// How long a graceful shutdown may take before the process is aborted
    /// (e.g. "1s", "500ms")
    #[serde(default = "default_abort_delay")]
    pub abort_delay: String,
    /// Exit code reported when an untrusted failure stops the process
    #[serde(default = "default_exit_code")]
    pub exit_code: u8,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            abort_delay: default_abort_delay(),
            exit_code: default_exit_code(),
        }
    }
}

impl SupervisorConfig {
    /// Parsed forced-abort delay
    ///
    /// # Errors
    ///
    /// Returns an error if the delay is not a valid duration or is zero
    pub fn abort_delay(&self) -> anyhow::Result<Duration> {
        let delay = duration_str::parse(&self.abort_delay)
            .map_err(|e| anyhow::anyhow!("invalid supervisor.abort_delay '{}': {e}", self.abort_delay))?;

        if delay.is_zero() {
            anyhow::bail!("supervisor.abort_delay must be greater than zero");
        }

        Ok(delay)
    }
}

fn default_abort_delay() -> String {
    "1s".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_exit_code() -> u8 {
    1
}
