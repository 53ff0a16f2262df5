//! External collaborators reached by side-effecting filters.
//!
//! The template engine only talks to these traits:
//!
//! - **Shell**: run an interpreter with command source on stdin
//! - **Completion**: ask an LLM for a completion
//! - **Interaction**: let the user edit text, confirm a command, or see output
//!
//! Concrete implementations live in the submodules; tests substitute stubs.

mod cache;
mod completion;
mod shell;
mod terminal;

pub use cache::{CachedCompletion, NO_CACHE_ENV, PromptCache};
pub use completion::HttpCompletion;
pub use shell::SystemShell;
pub use terminal::{TerminalInteraction, resolve_editor};

use crate::error::Result;

/// A command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Interpreter command line, e.g. `bash` or `python3 -u`.
    pub interpreter: String,
    /// Source fed to the interpreter on stdin.
    pub source: String,
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs commands. Returns `Err` only when the process cannot be started;
/// a non-zero exit is reported through [`ExecOutput::exit_code`].
pub trait Shell {
    fn exec(&mut self, request: &ExecRequest) -> Result<ExecOutput>;
}

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier, optionally prefixed with a provider (`openai/gpt-4o`).
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens, passed through to the provider.
    pub max_tokens: Option<u64>,
}

/// Produces LLM completions.
pub trait Completion {
    fn complete(&mut self, request: &CompletionRequest) -> Result<String>;
}

/// Answer to an `askrun` confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Execute,
    Edit,
    Quit,
}

/// User-facing interaction.
pub trait Interaction {
    /// Let the user edit `seed`. `None` means the user aborted.
    fn edit(&mut self, seed: &str) -> Result<Option<String>>;

    /// Show `command` and ask what to do with it.
    fn confirm(&mut self, command: &str) -> Result<Choice>;

    /// Display text to the user immediately, outside the rendered output.
    fn show(&mut self, text: &str) -> Result<()>;
}
