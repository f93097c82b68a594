use serde::Deserialize;

/// Health check endpoint configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_path")]
    pub path: String,
    /// Methods the health route answers; anything else is a 405
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_path(),
            methods: default_methods(),
        }
    }
}

impl HealthConfig {
    /// Parse the configured method allow-list
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid HTTP method token
    pub fn allowed_methods(&self) -> anyhow::Result<Vec<http::Method>> {
        self.methods
            .iter()
            .map(|method| {
                http::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .map_err(|e| anyhow::anyhow!("invalid health method '{method}': {e}"))
            })
            .collect()
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_path() -> String {
    "/health".to_string()
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string(), "HEAD".to_string()]
}
