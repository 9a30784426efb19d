use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::console::clock::DEFAULT_CLOCK_FORMAT;
use crate::console::status::{DEFAULT_INITIAL_DELAY, DEFAULT_POLL_INTERVAL};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";

/// Optional colour overrides, `#RRGGBB` or `#RGB`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the plua runtime API listens
    pub base_url: String,

    /// Timeout hint sent with every execute request (seconds)
    pub exec_timeout_secs: f64,

    /// Client-side bound on a single request (seconds)
    pub client_timeout_secs: u64,

    /// Status refresh period while the status tab is open (seconds)
    pub poll_interval_secs: u64,

    /// Delay before the one-off status refresh after start-up
    pub initial_refresh_delay_ms: u64,

    /// strftime format for the header clock
    pub clock_format: String,

    /// Oldest output lines are dropped past this count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_lines: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            exec_timeout_secs: crate::api::DEFAULT_EXEC_TIMEOUT,
            client_timeout_secs: 35,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            initial_refresh_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            clock_format: DEFAULT_CLOCK_FORMAT.to_string(),
            max_output_lines: Some(5000),
            theme: None,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("plua-console");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location, or create it with defaults
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if !path.exists() {
            let config = AppConfig::default();
            if let Err(e) = config.save_to(&path) {
                tracing::warn!("Could not write default config: {}", e);
            }
            return Ok(config);
        }

        Ok(Self::load_from(&path))
    }

    /// Load config from an explicit file; unreadable or invalid files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => return config.sanitized(),
                Err(e) => tracing::warn!("Failed to parse config {}: {}", path.display(), e),
            },
            Err(e) => tracing::warn!("Failed to read config {}: {}", path.display(), e),
        }
        AppConfig::default()
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&self.clone().sanitized())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Point at another runtime; a blank URL keeps the configured one
    pub fn with_base_url(mut self, url: &str) -> Self {
        if url.trim().is_empty() {
            tracing::warn!("Ignoring empty base URL override, using {}", self.base_url);
            return self;
        }
        self.base_url = url.to_string();
        self.sanitized()
    }

    /// Replace values that would make the console misbehave
    fn sanitized(mut self) -> Self {
        let defaults = AppConfig::default();

        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            self.base_url = defaults.base_url;
        }
        if !(self.exec_timeout_secs > 0.0) {
            self.exec_timeout_secs = defaults.exec_timeout_secs;
        }
        if self.client_timeout_secs == 0 {
            self.client_timeout_secs = defaults.client_timeout_secs;
        }
        if self.poll_interval_secs == 0 {
            self.poll_interval_secs = defaults.poll_interval_secs;
        }
        if self.clock_format.trim().is_empty() {
            self.clock_format = defaults.clock_format;
        }
        self
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn initial_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.initial_refresh_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            base_url: "http://hc3.local:8888".to_string(),
            exec_timeout_secs: 10.0,
            max_output_lines: Some(200),
            theme: Some(ThemeConfig {
                accent: Some("#ffc107".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("base_url = \"http://10.0.0.2:8888/\"").unwrap();
        let config = config.sanitized();

        assert_eq!(config.base_url, "http://10.0.0.2:8888");
        assert_eq!(config.exec_timeout_secs, 30.0);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.initial_refresh_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_sanitize_rejects_nonsense() {
        let config: AppConfig = toml::from_str(
            "base_url = \"  \"\nexec_timeout_secs = -1.0\npoll_interval_secs = 0\nclock_format = \"\"",
        )
        .unwrap();
        let config = config.sanitized();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.exec_timeout_secs, 30.0);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.clock_format, DEFAULT_CLOCK_FORMAT);
    }

    #[test]
    fn test_base_url_override() {
        let config = AppConfig::default().with_base_url("  http://hc3.local:8888/ ");
        assert_eq!(config.base_url, "http://hc3.local:8888");

        let config = config.with_base_url("");
        assert_eq!(config.base_url, "http://hc3.local:8888");

        let config = AppConfig::default().with_base_url("   ");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_from_invalid_file_falls_back() {
        let path = std::env::temp_dir().join(format!(
            "plua-console-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "base_url = [not toml").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config, AppConfig::default());

        let _ = std::fs::remove_file(&path);
    }
}
