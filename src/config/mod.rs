use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL. Normalized to always end in the API root segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Stable route to navigate to once a matriculation payment is
    /// confirmed
    #[serde(default = "default_landing_route")]
    pub landing_route: String,
    /// Route to land on after an online-payment confirmation
    #[serde(default = "default_dues_route")]
    pub dues_route: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            landing_route: default_landing_route(),
            dues_route: default_dues_route(),
        }
    }
}

fn default_landing_route() -> String {
    "/".to_string()
}

fn default_dues_route() -> String {
    "/?tab=mis-pagos".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        // Env var wins over the file, same precedence the original client
        // gave its VITE_API_URL.
        if let Ok(url) = std::env::var("CLUBGATE_API_URL") {
            if !url.is_empty() {
                config.api.base_url = url;
            }
        }

        Ok(config)
    }

    pub fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            gateway: GatewayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Normalize a configured base URL so it always ends in the `/api` root
/// segment, without doubling it. Trailing slashes are dropped first, so
/// the result never ends in `/`.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    }
}
