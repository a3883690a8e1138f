//! Configuration loading and validation.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file,
//! `COACH__SECTION__KEY` environment variables, then the short legacy
//! variables `RIOT_KEY`, `COACH_MODEL` and `ALLOWED_ORIGINS`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Riot API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Riot API key; requests fail with `missing_config` without one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Send every Riot call to this host instead of the routed hosts
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_riot_timeout")]
    pub timeout_seconds: u64,

    /// How many recent matches to summarize
    #[serde(default = "default_match_count")]
    pub match_count: u32,

    /// Minimum spacing between match detail requests
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Match detail requests allowed in flight at once
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
}

fn default_riot_timeout() -> u64 {
    8
}

fn default_match_count() -> u32 {
    5
}

fn default_request_delay() -> u64 {
    50
}

fn default_detail_concurrency() -> usize {
    1
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_seconds: default_riot_timeout(),
            match_count: default_match_count(),
            request_delay_ms: default_request_delay(),
            detail_concurrency: default_detail_concurrency(),
        }
    }
}

impl RiotConfig {
    /// The API key, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for RiotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiotConfig")
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("match_count", &self.match_count)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("detail_concurrency", &self.detail_concurrency)
            .finish()
    }
}

/// AI backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Backend type: "ollama" or "anthropic"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base URL for the AI service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model to use; coaching is disabled when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the remote backend's API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_backend() -> String {
    "ollama".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    400
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: default_base_url(),
            model: None,
            api_key_env: default_api_key_env(),
            timeout_seconds: default_ai_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS; empty or "*" allows any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl ServerConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub riot: RiotConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            riot: RiotConfig::default(),
            ai: AiConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("COACH")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.apply_legacy_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `RIOT_KEY`, `COACH_MODEL` and `ALLOWED_ORIGINS`.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("RIOT_KEY").filter(|k| !k.trim().is_empty()) {
            self.riot.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = lookup("COACH_MODEL").filter(|m| !m.trim().is_empty()) {
            self.ai.model = Some(model.trim().to_string());
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Validate the configuration.
    ///
    /// A missing Riot key is not an error here; it is reported per request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.riot.timeout_seconds == 0 || self.ai.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.riot.match_count) {
            return Err(ConfigError::ValidationError(
                "Match count must be between 1 and 100".to_string(),
            ));
        }

        if self.riot.detail_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "Detail concurrency must be greater than 0".to_string(),
            ));
        }

        if let Some(base_url) = &self.riot.base_url {
            url::Url::parse(base_url).map_err(|e| {
                ConfigError::ValidationError(format!("Invalid Riot base URL {}: {}", base_url, e))
            })?;
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert!(config.riot.api_key().is_none());
        assert_eq!(config.riot.match_count, 5);
        assert_eq!(config.riot.detail_concurrency, 1);
        assert!(config.ai.model.is_none());
        assert_eq!(config.server.port, 8080);
        assert!(config.server.allows_any_origin());
    }

    #[test]
    fn test_config_validation_ok_without_api_key() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_values() {
        let mut config = AppConfig::default();
        config.riot.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.riot.match_count = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.riot.detail_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.riot.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let mut config = AppConfig::default();
        config.riot.api_key = Some("   ".to_string());
        assert!(config.riot.api_key().is_none());
    }

    #[test]
    fn test_api_key_is_redacted_in_debug() {
        let mut config = AppConfig::default();
        config.riot.api_key = Some("RGAPI-secret".to_string());

        let debug = format!("{:?}", config);
        assert!(!debug.contains("RGAPI-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_legacy_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("RIOT_KEY", " RGAPI-123 "),
            ("COACH_MODEL", "llama3.2"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_legacy_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.riot.api_key(), Some("RGAPI-123"));
        assert_eq!(config.ai.model.as_deref(), Some("llama3.2"));
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.server.allows_any_origin());
    }

    #[test]
    fn test_legacy_env_absent_keeps_values() {
        let mut config = AppConfig::default();
        config.riot.api_key = Some("from-file".to_string());
        config.apply_legacy_env(|_| None);

        assert_eq!(config.riot.api_key(), Some("from-file"));
        assert_eq!(config.server.allowed_origins, vec!["*"]);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coach.toml");
        std::fs::write(
            &path,
            r#"
log_level = "debug"

[riot]
match_count = 10
request_delay_ms = 120

[ai]
model = "llama3.2"

[server]
port = 9090
allowed_origins = ["https://coach.example"]
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.riot.match_count, 10);
        assert_eq!(config.riot.request_delay_ms, 120);
        assert_eq!(config.riot.timeout_seconds, 8);
        assert_eq!(config.ai.model.as_deref(), Some("llama3.2"));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.allowed_origins, vec!["https://coach.example"]);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}
