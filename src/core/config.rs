//! Configuration management for Medscribe
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/medscribe/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::agent::retry::RetryPolicy;
use crate::core::error::{MedscribeError, Result};

/// Main configuration for Medscribe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote model provider
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Agent retry behavior
    #[serde(default)]
    pub agents: AgentConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which remote API the agents talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Ollama `/api/chat`
    Ollama,
    /// Any OpenAI-compatible `/chat/completions` endpoint
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

impl FromStr for ProviderType {
    type Err = MedscribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(ProviderType::Ollama),
            "openai" | "openai-compatible" => Ok(ProviderType::OpenAi),
            other => Err(MedscribeError::config(format!("Unknown provider '{}'", other))),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "ollama"),
            ProviderType::OpenAi => write!(f, "openai"),
        }
    }
}

/// Remote provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider kind
    pub kind: ProviderType,
    /// API base URL
    pub base_url: String,
    /// Model name passed on every request
    pub model: String,
    /// Bearer token for OpenAI-compatible endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
}

/// Agent behavior configuration, shared by every role
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Additional attempts after the first failed call
    /// Default: 2
    pub max_retries: u32,
    /// Trace every attempt
    /// Default: true
    pub verbose: bool,
    /// Per-call timeout in seconds (0 disables)
    pub call_timeout_secs: u64,
    /// First backoff delay in milliseconds (0 disables backoff)
    pub backoff_base_ms: u64,
    /// Upper bound for a single backoff delay
    pub backoff_max_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// ERROR, WARN, INFO, DEBUG or TRACE
    pub level: String,
    /// pretty, compact or json
    pub format: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let kind = env::var("MEDSCRIBE_PROVIDER")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(ProviderType::Ollama);

        let default_url = match kind {
            ProviderType::Ollama => "http://localhost:11434",
            ProviderType::OpenAi => "https://api.openai.com/v1",
        };
        let default_model = match kind {
            ProviderType::Ollama => "qwen3:8b",
            ProviderType::OpenAi => "gpt-4o-mini",
        };

        Self {
            kind,
            base_url: env::var("MEDSCRIBE_BASE_URL").unwrap_or_else(|_| default_url.to_string()),
            model: env::var("MEDSCRIBE_MODEL").unwrap_or_else(|_| default_model.to_string()),
            api_key: env::var("MEDSCRIBE_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok(),
            timeout_secs: 120,
            temperature: 0.3,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_retries: env::var("MEDSCRIBE_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            verbose: env::var("MEDSCRIBE_VERBOSE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            call_timeout_secs: 60,
            backoff_base_ms: 250,
            backoff_max_ms: 4000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medscribe")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    ///
    /// A missing config file means defaults; an unreadable or invalid one is
    /// an error.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = Self::config_file();
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(MedscribeError::config("Config file not found"));
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MedscribeError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            MedscribeError::Config(msg) => {
                MedscribeError::config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| MedscribeError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.provider.base_url).map_err(|e| {
            MedscribeError::config(format!(
                "Invalid base_url '{}': {}",
                self.provider.base_url, e
            ))
        })?;

        if self.provider.model.trim().is_empty() {
            return Err(MedscribeError::config("Model name must not be empty"));
        }

        if self.agents.backoff_base_ms > self.agents.backoff_max_ms {
            return Err(MedscribeError::config(
                "backoff_base_ms must not exceed backoff_max_ms",
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                MedscribeError::config(format!("Failed to create config dir: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| MedscribeError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| MedscribeError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Retry settings handed to the agent manager
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::new(self.agents.max_retries, self.agents.verbose);

        if self.agents.call_timeout_secs > 0 {
            policy = policy.with_timeout(Duration::from_secs(self.agents.call_timeout_secs));
        }

        if self.agents.backoff_base_ms > 0 {
            policy = policy.with_backoff(
                Duration::from_millis(self.agents.backoff_base_ms),
                Duration::from_millis(self.agents.backoff_max_ms),
            );
        }

        policy
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
