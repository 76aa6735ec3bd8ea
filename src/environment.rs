// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::channel::ScrollAnchor;
use crate::core::DEFAULT_TIMEOUT_SECS;

const API_URL_OVERRIDE: &str = "HIRECHAT_API_URL";

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_scroll_threshold() -> f64 {
    100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub api_base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold_px: f64,
    /// Section the values came from
    #[serde(skip)]
    pub environment: String,
    /// `api_base_url` was replaced by `HIRECHAT_API_URL`
    #[serde(skip)]
    pub api_url_overridden: bool,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    pub fn get_environment() -> String {
        std::env::var("HIRECHAT_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// Read and select the section for `environment`.
    ///
    /// Does not log; it runs before the subscriber is installed.
    pub fn load_from_path(config_path: &Path, environment: &str) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "{} not found. The client cannot start without configuration.",
                config_path.display()
            );
        }

        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let mut config = Self::parse(&config_content, environment)?;

        if let Ok(url) = std::env::var(API_URL_OVERRIDE) {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().trim_end_matches('/').to_string();
                config.api_url_overridden = true;
            }
        }
        Ok(config)
    }

    fn parse(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse config.yaml")?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        if env_config.api_base_url.trim().is_empty() {
            anyhow::bail!("api_base_url must not be empty for environment '{}'", environment);
        }
        Ok(Self {
            api_base_url: env_config.api_base_url.trim_end_matches('/').to_string(),
            environment: environment.to_string(),
            ..env_config
        })
    }

    pub fn scroll_anchor(&self) -> ScrollAnchor {
        ScrollAnchor::new(self.scroll_threshold_px)
    }
}
