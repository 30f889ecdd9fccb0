//! Configuration management for ChatLedger
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::chat::{Principal, DEFAULT_CONTEXT_MESSAGES};
use crate::error::{ChatLedgerError, Result};
use crate::plans::PlanTier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Main configuration structure for ChatLedger
///
/// Holds the completion provider settings, chat behavior, and the
/// principal the CLI acts on behalf of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Completion provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Chat behavior configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Principal configuration
    #[serde(default)]
    pub user: UserConfig,
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// OpenRouter configuration
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

fn default_provider_type() -> String {
    "openrouter".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            openrouter: OpenRouterConfig::default(),
        }
    }
}

/// OpenRouter provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// API base URL (point at a mock server in tests)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key; usually supplied via the OPENROUTER_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model completions are requested from
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for chat completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default completion token budget when no plan cap applies
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Optional HTTP-Referer attribution header
    #[serde(default)]
    pub site_url: Option<String>,

    /// Optional X-Title attribution header
    #[serde(default)]
    pub site_name: Option<String>,
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "deepseek/deepseek-r1-0528".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4_000
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
            site_url: None,
            site_name: None,
        }
    }
}

/// Chat behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Default system prompt preset for new sends
    #[serde(default = "default_preset")]
    pub system_prompt_preset: String,

    /// How many prior messages a context window may carry
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,
}

fn default_preset() -> String {
    crate::prompts::DEFAULT_PRESET.to_string()
}

fn default_max_context_messages() -> usize {
    DEFAULT_CONTEXT_MESSAGES
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt_preset: default_preset(),
            max_context_messages: default_max_context_messages(),
        }
    }
}

/// Principal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Identifier usage is tracked under; required for any chat command
    #[serde(default)]
    pub id: Option<String>,

    /// Plan tier name (free, pro, premium)
    #[serde(default = "default_plan")]
    pub plan: String,
}

fn default_plan() -> String {
    "free".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: None,
            plan: default_plan(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatLedgerError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatLedgerError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var("OPENROUTER_API_KEY") {
            if !api_key.is_empty() {
                self.provider.openrouter.api_key = Some(api_key);
            }
        }

        if let Ok(api_base) = std::env::var("CHATLEDGER_API_BASE") {
            self.provider.openrouter.api_base = api_base;
        }

        if let Ok(model) = std::env::var("CHATLEDGER_MODEL") {
            self.provider.openrouter.model = model;
        }

        if let Ok(user) = std::env::var("CHATLEDGER_USER") {
            self.user.id = Some(user);
        }

        if let Ok(plan) = std::env::var("CHATLEDGER_PLAN") {
            self.user.plan = plan;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(user) = &cli.user {
            self.user.id = Some(user.clone());
        }

        if let Some(plan) = &cli.plan {
            self.user.plan = plan.clone();
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a `Config` error for out-of-range values, an unknown
    /// provider type or prompt preset, or an `UnknownPlan` error for a
    /// tier outside the closed set.
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(ChatLedgerError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["openrouter"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(ChatLedgerError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if !(0.0..=2.0).contains(&self.provider.openrouter.temperature) {
            return Err(ChatLedgerError::Config(
                "provider.openrouter.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.provider.openrouter.max_tokens == 0 {
            return Err(ChatLedgerError::Config(
                "provider.openrouter.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.provider.openrouter.timeout_seconds == 0 {
            return Err(ChatLedgerError::Config(
                "provider.openrouter.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.max_context_messages == 0 {
            return Err(ChatLedgerError::Config(
                "chat.max_context_messages must be greater than 0".to_string(),
            )
            .into());
        }

        // Reject unknown tiers and presets up front rather than at send time.
        PlanTier::from_str(&self.user.plan)?;
        crate::prompts::preset(&self.chat.system_prompt_preset)?;

        Ok(())
    }

    /// Resolve the configured principal
    ///
    /// # Errors
    ///
    /// Returns `PrincipalMissing` when no user id is configured, or
    /// `UnknownPlan` for a tier outside the closed set.
    pub fn principal(&self) -> Result<Principal> {
        let id = self
            .user
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(ChatLedgerError::PrincipalMissing)?;
        let plan = PlanTier::from_str(&self.user.plan)?;

        Ok(Principal {
            id: id.to_string(),
            plan,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            chat: ChatConfig::default(),
            user: UserConfig::default(),
        }
    }
}
