use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

const DEBUG_ENV: &str = "RECON_DEBUG";
const TIMEOUT_ENV: &str = "RECON_REQUEST_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SdkConfig {
    /// Upper bound on one fingerprinting step before it fails with `RequestTimeout`.
    pub request_timeout_ms: u64,
    /// Pending debug events kept before new ones are dropped.
    pub debug_channel_capacity: usize,
    pub debug_enabled: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            debug_channel_capacity: 64,
            debug_enabled: false,
        }
    }
}

impl SdkConfig {
    /// Reads the config file; a missing file yields defaults and an unreadable
    /// body is logged and replaced by defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read SDK config from {}", path.display()))?;
        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!("Ignoring malformed SDK config {}: {err}", path.display());
            Self::default()
        }))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write SDK config to {}", path.display()))
    }

    /// Overlays `RECON_DEBUG` and `RECON_REQUEST_TIMEOUT_MS` from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(
            std::env::var(DEBUG_ENV).ok().as_deref(),
            std::env::var(TIMEOUT_ENV).ok().as_deref(),
        )
    }

    fn apply_overrides(mut self, debug: Option<&str>, timeout_ms: Option<&str>) -> Self {
        if let Some(value) = debug {
            self.debug_enabled = value == "1" || value.eq_ignore_ascii_case("true");
        }
        if let Some(value) = timeout_ms {
            match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.request_timeout_ms = ms,
                _ => warn!("Ignoring invalid {TIMEOUT_ENV}={value}"),
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SdkConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, SdkConfig::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdk.json");
        let config = SdkConfig {
            request_timeout_ms: 2_500,
            debug_channel_capacity: 8,
            debug_enabled: true,
        };

        config.save(&path).unwrap();
        assert_eq!(SdkConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdk.json");
        fs::write(&path, r#"{"requestTimeoutMs": 500}"#).unwrap();

        let config = SdkConfig::load(&path).unwrap();
        assert_eq!(config.request_timeout_ms, 500);
        assert_eq!(config.debug_channel_capacity, 64);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdk.json");
        fs::write(&path, "{not json").unwrap();

        assert_eq!(SdkConfig::load(&path).unwrap(), SdkConfig::default());
    }

    #[test]
    fn overrides_apply() {
        let config = SdkConfig::default().apply_overrides(Some("TRUE"), Some("1500"));
        assert!(config.debug_enabled);
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));

        let untouched = SdkConfig::default().apply_overrides(Some("0"), Some("soon"));
        assert!(!untouched.debug_enabled);
        assert_eq!(untouched.request_timeout_ms, 10_000);
    }
}
