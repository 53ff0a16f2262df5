//! Everything a filter may touch while a script renders.

use crate::backend::{
    CachedCompletion, Completion, HttpCompletion, Interaction, NO_CACHE_ENV, PromptCache, Shell,
    SystemShell, TerminalInteraction, resolve_editor,
};
use crate::config::Config;
use crate::error::Result;
use crate::journal::Journal;
use std::path::{Path, PathBuf};

/// Backends and settings shared by all filters of one run.
pub struct Runtime {
    pub shell: Box<dyn Shell>,
    pub completion: Box<dyn Completion>,
    pub interaction: Box<dyn Interaction>,
    /// Interpreter used by `run`/`askrun` without a `cmd` argument.
    pub interpreter: String,
    /// Relative paths in file filters resolve against this directory.
    pub base_dir: PathBuf,
    pub journal: Option<Journal>,
}

impl Runtime {
    /// Build the production runtime from config.
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self> {
        let cache = match config.cache_path() {
            Some(path) => {
                let reads = PromptCache::reads_allowed(
                    config.cache.enabled,
                    std::env::var(NO_CACHE_ENV).ok().as_deref(),
                );
                PromptCache::open(path, reads)?
            }
            None => PromptCache::disabled(),
        };
        let completion = CachedCompletion::new(HttpCompletion::from_config(config)?, cache);

        let editor = resolve_editor(
            config.editor.as_deref(),
            std::env::var("VISUAL").ok(),
            std::env::var("EDITOR").ok(),
        );

        Ok(Self {
            shell: Box::new(SystemShell::new(base_dir)),
            completion: Box::new(completion),
            interaction: Box::new(TerminalInteraction::new(editor)),
            interpreter: config.shell.clone(),
            base_dir: base_dir.to_path_buf(),
            journal: None,
        })
    }

    /// Resolve a path named by a script relative to [`Runtime::base_dir`].
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }
}
