//! Configuration types and defaults for siesta.
//!
//! This module defines nested sections, constants, and default value functions
//! used by the Config struct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the provider configured out of the box.
pub const DEFAULT_PROVIDER: &str = "openai";

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL; requests go to `{base_url}/chat/completions`.
    pub base_url: String,

    /// Environment variable holding the API key. Unset means no auth header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key_env: Option<&str>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key_env: api_key_env.map(str::to_string),
            extra: BTreeMap::new(),
        }
    }
}

/// Prompt cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve repeated prompts from the cache.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache file location. Defaults to the user cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: None,
        }
    }
}

/// Run journal settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Append an NDJSON record for every side effect.
    pub enabled: bool,

    /// Journal file location. Defaults to the user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Built-in providers available without any configuration.
pub fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let mut providers = BTreeMap::new();
    providers.insert(
        DEFAULT_PROVIDER.to_string(),
        ProviderConfig::new("https://api.openai.com/v1", Some("OPENAI_API_KEY")),
    );
    providers.insert(
        "openrouter".to_string(),
        ProviderConfig::new("https://openrouter.ai/api/v1", Some("OPENROUTER_API_KEY")),
    );
    providers.insert(
        "ollama".to_string(),
        ProviderConfig::new("http://localhost:11434/v1", None),
    );
    providers
}

/// Default glob patterns for script discovery.
pub fn default_script_patterns() -> Vec<String> {
    vec!["*".to_string()]
}

// Default value functions for serde
pub(crate) fn default_shell() -> String {
    "bash".to_string()
}
pub(crate) fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}
pub(crate) fn default_true() -> bool {
    true
}
