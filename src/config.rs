// ABOUTME: Parses the process-level transfer configuration from TOML
// ABOUTME: Carries connection coordinates and the retry budget, loaded once

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Process-level configuration: connection coordinates plus the retry budget.
///
/// Loaded once at startup and read-only thereafter. Every field has a default
/// matching the canonical flight-reservation deployment, so a partial TOML
/// file (or none at all) works.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Default database selected when an operation does not override it.
    pub database: String,
    /// Total connection attempt budget.
    pub max_retries: u32,
    /// Fixed delay between connection attempts, in seconds.
    pub retry_delay_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "flight_reservation".to_string(),
            max_retries: 3,
            retry_delay_secs: 2,
        }
    }
}

impl TransferConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse TOML config at {}", path.display()))?;
        Ok(config)
    }

    /// Fixed delay between connection attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
