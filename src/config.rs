use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::policy::Thresholds;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            port: default_health_port(),
        }
    }
}

fn default_endpoint() -> String {
    "https://mogestesema-safe-text-model.hf.space/analyze".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_health_enabled() -> bool {
    true
}

fn default_health_port() -> u16 {
    5000
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // Credentials are required for the bot to do anything at all, so an
        // empty value is a startup failure, not a runtime fallback.
        if config.telegram.bot_token.trim().is_empty() {
            bail!("telegram.bot_token must be set in {}", path.display());
        }
        if config.scoring.api_key.trim().is_empty() {
            bail!("scoring.api_key must be set in {}", path.display());
        }

        Ok(config)
    }
}
