//! Configuration loading, validation, and management for opsloop.
//!
//! Loads configuration from `~/.opsloop/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.opsloop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model provider: "openai", "openrouter", "ollama" or "custom"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL (required for "custom")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Orchestration loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Built-in action settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4-0125-preview".into()
}
fn default_temperature() -> f32 {
    0.0
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .finish()
    }
}

/// How mutating and destructive actions get approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Ask the operator on the terminal
    Prompt,
    /// Approve everything (unattended runs)
    AutoApprove,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Consecutive no-action responses tolerated before the run ends
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold: u32,

    /// Cap on model calls per run (0 = unbounded)
    #[serde(default)]
    pub max_rounds: u32,

    #[serde(default = "default_approval")]
    pub approval: ApprovalMode,

    /// Replace the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_idle_threshold() -> u32 {
    2
}
fn default_approval() -> ApprovalMode {
    ApprovalMode::Prompt
}

impl AgentSettings {
    pub fn max_rounds(&self) -> Option<u32> {
        (self.max_rounds > 0).then_some(self.max_rounds)
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            idle_threshold: default_idle_threshold(),
            max_rounds: 0,
            approval: default_approval(),
            system_prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Programs `run_cli` may invoke. Empty = any program.
    #[serde(default = "default_allowed_programs")]
    pub allowed_programs: Vec<String>,

    /// Path prefixes no filesystem action may touch
    #[serde(default = "default_forbidden_paths")]
    pub forbidden_paths: Vec<String>,

    #[serde(default = "default_terraform_binary")]
    pub terraform_binary: String,

    /// Infrastructure definition file, relative to the working directory
    #[serde(default = "default_terraform_file")]
    pub terraform_file: String,
}

fn default_allowed_programs() -> Vec<String> {
    vec!["aws".into(), "terraform".into(), "git".into()]
}
fn default_forbidden_paths() -> Vec<String> {
    vec![
        "/etc".into(),
        "/proc".into(),
        "/sys".into(),
        "~/.ssh".into(),
        "~/.gnupg".into(),
        "~/.aws".into(),
    ]
}
fn default_terraform_binary() -> String {
    "terraform".into()
}
fn default_terraform_file() -> String {
    "main.tf".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_programs: default_allowed_programs(),
            forbidden_paths: default_forbidden_paths(),
            terraform_binary: default_terraform_binary(),
            terraform_file: default_terraform_file(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.opsloop/config.toml).
    ///
    /// Environment overrides:
    /// - `OPSLOOP_API_KEY`, then `OPENAI_API_KEY`, then `OPENROUTER_API_KEY`
    ///   (only when the file sets no key)
    /// - `OPSLOOP_PROVIDER`
    /// - `OPSLOOP_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("OPSLOOP_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .or_else(|| lookup("OPENROUTER_API_KEY"));
        }
        if let Some(provider) = lookup("OPSLOOP_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("OPSLOOP_MODEL") {
            self.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".opsloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.idle_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "agent.idle_threshold must be at least 1".into(),
            ));
        }

        if !matches!(
            self.provider.as_str(),
            "openai" | "openrouter" | "ollama" | "custom"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "unknown provider '{}'",
                self.provider
            )));
        }

        if self.provider == "custom" && self.api_url.is_none() {
            return Err(ConfigError::ValidationError(
                "provider 'custom' requires api_url".into(),
            ));
        }

        if self.tools.terraform_file.trim().is_empty()
            || Path::new(&self.tools.terraform_file).is_absolute()
        {
            return Err(ConfigError::ValidationError(
                "tools.terraform_file must be a relative path".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            agent: AgentSettings::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
