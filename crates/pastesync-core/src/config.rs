//! Client configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/pastesync/config.toml)
//! 3. Environment variables (PASTESYNC_* prefix)
//!
//! Environment variables take precedence over config file values. The CLI
//! applies its own flags on top of the loaded result.

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::PasteId;
use crate::sync::ReconnectPolicy;

/// Environment variable prefix
const ENV_PREFIX: &str = "PASTESYNC";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the paste service (HTTP API and live endpoint)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Reconnect attempts before giving up on the live connection
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Base reconnect delay in milliseconds, multiplied by the attempt number
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,

    /// Timeout for one-shot HTTP requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log file path (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (PASTESYNC_SERVER_URL, ...)
    /// 2. Config file (~/.config/pastesync/config.toml or PASTESYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // PASTESYNC_SERVER_URL
        if let Ok(val) = std::env::var(format!("{}_SERVER_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.server_url = val;
            }
        }

        // PASTESYNC_MAX_RECONNECT_ATTEMPTS
        if let Ok(val) = std::env::var(format!("{}_MAX_RECONNECT_ATTEMPTS", ENV_PREFIX)) {
            if let Ok(n) = val.parse() {
                self.max_reconnect_attempts = n;
            }
        }

        // PASTESYNC_RECONNECT_DELAY_MS
        if let Ok(val) = std::env::var(format!("{}_RECONNECT_DELAY_MS", ENV_PREFIX)) {
            if let Ok(ms) = val.parse() {
                self.reconnect_base_delay_ms = ms;
            }
        }

        // PASTESYNC_LOG_FILE
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Check that the server URL is usable for both HTTP and WebSocket access
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "Unsupported scheme '{}' in server_url '{}'. Use http:// or https://",
                url.scheme(),
                self.server_url
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with PASTESYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pastesync")
            .join("config.toml")
    }

    /// Parsed server URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.server_url)
            .with_context(|| format!("Invalid server_url: '{}'", self.server_url))
    }

    /// Build an HTTP URL for a path on the paste service
    ///
    /// `path` is appended below the server URL, so a service mounted under a
    /// sub-path (`https://host/paste`) keeps its prefix.
    pub fn api_url(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url()?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        base.join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid request path: '{}'", path))
    }

    /// WebSocket URL for a paste's live endpoint
    ///
    /// `http` maps to `ws` and `https` to `wss`; the host and port are kept.
    pub fn ws_url(&self, id: &PasteId) -> Result<String> {
        let mut url = self.api_url(&format!("/ws/{}", id))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        if url.set_scheme(scheme).is_err() {
            bail!("Cannot derive WebSocket URL from '{}'", self.server_url);
        }
        Ok(url.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reconnect policy for the live subscription
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_base_delay_ms),
            self.max_reconnect_attempts,
        )
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "PASTESYNC_SERVER_URL",
        "PASTESYNC_MAX_RECONNECT_ATTEMPTS",
        "PASTESYNC_RECONNECT_DELAY_MS",
        "PASTESYNC_LOG_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.reconnect_base_delay_ms, 2000);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_ws_url_follows_http_scheme() {
        let id = PasteId::parse("00042").unwrap();

        let config = Config::default();
        assert_eq!(config.ws_url(&id).unwrap(), "ws://localhost:8080/ws/00042");

        let config = Config {
            server_url: "https://paste.example.com".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.ws_url(&id).unwrap(),
            "wss://paste.example.com/ws/00042"
        );
    }

    #[test]
    fn test_api_url() {
        let config = Config {
            server_url: "https://paste.example.com".to_string(),
            ..Config::default()
        };
        let url = config.api_url("/api/history").unwrap();
        assert_eq!(url.as_str(), "https://paste.example.com/api/history");
    }

    #[test]
    fn test_urls_keep_server_path_prefix() {
        let id = PasteId::parse("00001").unwrap();

        for server_url in ["https://example.com/paste", "https://example.com/paste/"] {
            let config = Config {
                server_url: server_url.to_string(),
                ..Config::default()
            };
            assert_eq!(
                config.api_url("/api/00001").unwrap().as_str(),
                "https://example.com/paste/api/00001"
            );
            assert_eq!(
                config.api_url("/create").unwrap().as_str(),
                "https://example.com/paste/create"
            );
            assert_eq!(
                config.ws_url(&id).unwrap(),
                "wss://example.com/paste/ws/00001"
            );
        }
    }

    #[test]
    fn test_rejects_zero_request_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let result = Config::load_from_str("request_timeout_secs = 0");
        assert!(result.is_err());

        let config = Config::load_from_str("request_timeout_secs = 1").unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_reconnect_policy_from_config() {
        let config = Config {
            max_reconnect_attempts: 3,
            reconnect_base_delay_ms: 500,
            ..Config::default()
        };
        let policy = config.reconnect_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_env_override_server_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("PASTESYNC_SERVER_URL", "https://other.example.com");
        config.apply_env_overrides();
        assert_eq!(config.server_url, "https://other.example.com");

        // Empty string keeps the current value
        env::set_var("PASTESYNC_SERVER_URL", "");
        config.apply_env_overrides();
        assert_eq!(config.server_url, "https://other.example.com");
    }

    #[test]
    fn test_env_override_reconnect() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("PASTESYNC_MAX_RECONNECT_ATTEMPTS", "9");
        env::set_var("PASTESYNC_RECONNECT_DELAY_MS", "250");
        config.apply_env_overrides();
        assert_eq!(config.max_reconnect_attempts, 9);
        assert_eq!(config.reconnect_base_delay_ms, 250);

        // Garbage is ignored
        env::set_var("PASTESYNC_MAX_RECONNECT_ATTEMPTS", "lots");
        config.apply_env_overrides();
        assert_eq!(config.max_reconnect_attempts, 9);
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let _guard = EnvGuard::new(ENV_VARS);

        let result = Config::load_from_str(r#"server_url = "ftp://example.com""#);
        assert!(result.is_err());

        let result = Config::load_from_str(r#"server_url = "not a url""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            server_url = "https://paste.example.com"
            max_reconnect_attempts = 2
            reconnect_base_delay_ms = 100
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.server_url, "https://paste.example.com");
        assert_eq!(config.max_reconnect_attempts, 2);
        assert_eq!(config.reconnect_base_delay_ms, 100);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            server_url: "https://saved.example.com".to_string(),
            log_file: Some(PathBuf::from("/tmp/pastesync.log")),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server_url, "https://saved.example.com");
        assert_eq!(loaded.log_file, Some(PathBuf::from("/tmp/pastesync.log")));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.server_url, "http://localhost:8080");
    }
}
