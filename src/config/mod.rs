//! Configuration management
//!
//! YAML-based configuration with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for everything except region and token

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::error::{ComError, ComResult};
use crate::utils::validation::validate_region;

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComConfig {
    /// API region, e.g. `us-west` or `eu-central`
    #[serde(default)]
    pub region: String,
    /// Bearer token obtained from the GreenLake token endpoint
    #[serde(default)]
    pub access_token: String,
    /// Full base URL override; normally derived from the region.
    /// Mostly useful for pointing tests at a local mock server.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds (supports both timeout_secs and timeout)
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_ssl_verify() -> bool {
    true
}

impl Default for ComConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            access_token: String::new(),
            base_url: None,
            timeout_secs: default_timeout(),
            ssl_verify: default_ssl_verify(),
        }
    }
}

impl ComConfig {
    /// Load configuration from file and environment.
    ///
    /// Order: `.env` file, then `COM_CONFIG` path override or the standard
    /// file locations, then `COM_*` environment variable overrides, then
    /// validation.
    pub fn load() -> ComResult<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("COM_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = if let Some(ref path) = config_path {
            if path.exists() {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    ComError::config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                serde_norway::from_str(&contents).map_err(|e| {
                    ComError::config(format!("Failed to parse config file {:?}: {}", path, e))
                })?
            } else {
                eprintln!("[CONFIG] Config path set but file not found: {:?}", path);
                ComConfig::default()
            }
        } else {
            ComConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Current directory
            PathBuf::from("compute-ops.yaml"),
            PathBuf::from("config/compute-ops.yaml"),
            // System config directory
            PathBuf::from("/etc/compute-ops/config.yaml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("compute-ops/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(region) = std::env::var("COM_REGION") {
            self.region = region;
        }
        if let Ok(token) = std::env::var("COM_ACCESS_TOKEN") {
            self.access_token = token;
        }
        if let Ok(base_url) = std::env::var("COM_BASE_URL") {
            self.base_url = Some(base_url);
        }
        if let Ok(timeout) = std::env::var("COM_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }
        if let Ok(verify) = std::env::var("COM_SSL_VERIFY") {
            if let Ok(v) = verify.parse() {
                self.ssl_verify = v;
            }
        }
    }

    /// Validate the assembled configuration
    pub fn validate(&self) -> ComResult<()> {
        validate_region(&self.region)
            .map_err(|e| ComError::config(format!("Invalid region: {}", e)))?;

        if self.access_token.is_empty() {
            return Err(ComError::config(
                "access_token must be set (config file or COM_ACCESS_TOKEN)",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ComError::config("timeout_secs cannot be 0"));
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ComError::config(format!(
                    "base_url must start with http:// or https://, got {}",
                    base_url
                )));
            }
        }

        Ok(())
    }
}
