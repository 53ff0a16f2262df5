//! Config loading, validation, and lookup operations.

use super::model::Config;
use super::types::{ProviderConfig, default_providers};
use crate::error::{Result, SiestaError};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SIESTA_CONFIG";

/// Environment variable with extra script directories (`:`-separated).
pub const SCRIPT_PATH_ENV: &str = "SIESTA_PATH";

/// The per-user configuration directory, `~/.config/siesta` on Linux.
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join("siesta"))
}

/// Decide which config file to read.
///
/// Precedence: explicit `--config`, then `$SIESTA_CONFIG`, then the default
/// file in [`config_dir`]. Returns `None` when no location can be determined.
pub fn resolve_config_path(explicit: Option<&Path>, env_value: Option<OsString>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    config_dir().map(|dir| dir.join("config.yaml"))
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SiestaError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load the effective config for this process.
    ///
    /// A missing file at the default location yields defaults. A missing file
    /// that was asked for explicitly is an error.
    pub fn load_effective(explicit: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(explicit, std::env::var_os(CONFIG_ENV));
        match path {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            Some(path) if explicit.is_some() => Err(SiestaError::Config(format!(
                "config file '{}' does not exist",
                path.display()
            ))),
            _ => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document for a struct; treat it as defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| SiestaError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    #[cfg(test)]
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| SiestaError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `shell` must be non-empty
    /// - every provider needs a non-empty `base_url`
    /// - `default_provider` must name a known provider
    /// - `script_patterns` must be valid globs
    pub fn validate(&self) -> Result<()> {
        if self.shell.trim().is_empty() {
            return Err(SiestaError::Config(
                "config validation failed: shell must not be empty".to_string(),
            ));
        }

        for (name, provider) in &self.providers {
            if provider.base_url.trim().is_empty() {
                return Err(SiestaError::Config(format!(
                    "config validation failed: provider '{}' has an empty base_url",
                    name
                )));
            }
        }

        let providers = self.effective_providers();
        if !providers.contains_key(&self.default_provider) {
            return Err(SiestaError::Config(format!(
                "config validation failed: default_provider '{}' is not a known provider. Known: {}",
                self.default_provider,
                providers.keys().cloned().collect::<Vec<_>>().join(", ")
            )));
        }

        for pattern in &self.script_patterns {
            globset::Glob::new(pattern).map_err(|e| {
                SiestaError::Config(format!(
                    "config validation failed: invalid script pattern '{}': {}",
                    pattern, e
                ))
            })?;
        }

        Ok(())
    }

    /// Built-in providers with configured entries merged on top.
    pub fn effective_providers(&self) -> BTreeMap<String, ProviderConfig> {
        let mut providers = default_providers();
        for (name, provider) in &self.providers {
            providers.insert(name.clone(), provider.clone());
        }
        providers
    }

    /// Directories searched for scripts, in priority order.
    ///
    /// Configured `script_dirs` first, then `$SIESTA_PATH` entries, then the
    /// default `scripts` directory under [`config_dir`].
    pub fn script_search_path(&self, env_value: Option<OsString>) -> Vec<PathBuf> {
        let mut dirs = self.script_dirs.clone();
        if let Some(value) = env_value {
            dirs.extend(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(dir) = config_dir() {
            dirs.push(dir.join("scripts"));
        }
        dirs
    }

    /// Location of the prompt cache file.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache.path.clone().or_else(|| {
            dirs_next::cache_dir().map(|dir| dir.join("siesta").join("prompt_cache.json"))
        })
    }

    /// Location of the run journal.
    pub fn journal_path(&self) -> Option<PathBuf> {
        self.journal.path.clone().or_else(|| {
            dirs_next::data_dir().map(|dir| dir.join("siesta").join("journal.ndjson"))
        })
    }
}
