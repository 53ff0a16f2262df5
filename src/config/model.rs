//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for siesta.
///
/// This struct represents the contents of `~/.config/siesta/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Execution settings
    // =========================================================================
    /// Interpreter used by `run`/`askrun` when no `cmd` argument is given.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Editor for `askedit`. Falls back to `$VISUAL`, `$EDITOR`, then `vi`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    // =========================================================================
    // LLM settings
    // =========================================================================
    /// Provider used when a model id has no known provider prefix.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Providers keyed by the prefix used in model ids (`openai/gpt-4o`).
    ///
    /// Entries here are merged over the built-in providers.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// HTTP timeout for completion requests. Unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,

    #[serde(default)]
    pub cache: CacheConfig,

    // =========================================================================
    // Script discovery
    // =========================================================================
    /// Extra directories searched for scripts, before the default directory.
    #[serde(default)]
    pub script_dirs: Vec<PathBuf>,

    /// Glob patterns a file name must match to count as a script.
    #[serde(default = "default_script_patterns")]
    pub script_patterns: Vec<String>,

    // =========================================================================
    // Audit
    // =========================================================================
    #[serde(default)]
    pub journal: JournalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            editor: None,
            default_provider: default_provider(),
            providers: BTreeMap::new(),
            request_timeout_seconds: None,
            cache: CacheConfig::default(),
            script_dirs: Vec::new(),
            script_patterns: default_script_patterns(),
            journal: JournalConfig::default(),
        }
    }
}
