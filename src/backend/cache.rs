//! On-disk prompt cache.
//!
//! Completions are keyed by a SHA-256 digest of the model, the sampling
//! options and the prompt, and stored as one JSON object. Re-running a script with unchanged prompts
//! therefore skips the network entirely.

use super::{Completion, CompletionRequest};
use crate::error::{Result, SiestaError};
use crate::fs::atomic_write;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable that disables cache reads for one invocation.
pub const NO_CACHE_ENV: &str = "SIESTA_NO_CACHE";

/// Completion results persisted between runs.
#[derive(Debug, Default)]
pub struct PromptCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
    read_enabled: bool,
}

impl PromptCache {
    /// Open the cache file, treating a missing file as empty.
    ///
    /// A corrupt cache file is discarded with a warning rather than failing
    /// the run.
    pub fn open(path: PathBuf, read_enabled: bool) -> Result<Self> {
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable prompt cache");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(SiestaError::Io(format!(
                    "failed to read prompt cache '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        Ok(Self {
            path: Some(path),
            entries,
            read_enabled,
        })
    }

    /// A cache that never hits and never persists.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether reads are enabled by config and not vetoed by `SIESTA_NO_CACHE`.
    pub fn reads_allowed(config_enabled: bool, env_value: Option<&str>) -> bool {
        let vetoed = matches!(
            env_value.map(str::to_ascii_lowercase).as_deref(),
            Some("1" | "yes" | "true")
        );
        config_enabled && !vetoed
    }

    pub fn key(request: &CompletionRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.model.as_bytes());
        hasher.update(b"\0");
        hasher.update(format!("{:?}", request.temperature).as_bytes());
        hasher.update(b"\0");
        hasher.update(format!("{:?}", request.max_tokens).as_bytes());
        hasher.update(b"\0");
        hasher.update(request.prompt.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, request: &CompletionRequest) -> Option<&str> {
        if !self.read_enabled {
            return None;
        }
        self.entries.get(&Self::key(request)).map(String::as_str)
    }

    pub fn insert(&mut self, request: &CompletionRequest, completion: &str) -> Result<()> {
        self.entries
            .insert(Self::key(request), completion.to_string());

        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_vec(&self.entries)
            .map_err(|e| SiestaError::Io(format!("failed to serialize prompt cache: {}", e)))?;
        atomic_write(path, &content)
    }
}

/// Wraps a completion backend with a [`PromptCache`].
pub struct CachedCompletion<C> {
    inner: C,
    cache: PromptCache,
}

impl<C: Completion> CachedCompletion<C> {
    pub fn new(inner: C, cache: PromptCache) -> Self {
        Self { inner, cache }
    }
}

impl<C: Completion> Completion for CachedCompletion<C> {
    fn complete(&mut self, request: &CompletionRequest) -> Result<String> {
        if let Some(hit) = self.cache.get(request) {
            tracing::debug!(model = %request.model, "prompt cache hit");
            return Ok(hit.to_string());
        }

        let completion = self.inner.complete(request)?;
        if let Err(e) = self.cache.insert(request, &completion) {
            tracing::warn!(error = %e, "failed to persist prompt cache");
        }
        Ok(completion)
    }
}
