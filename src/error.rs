//! Error types for siesta.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Every error aborts the current render pass; the driver maps it to an exit code.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for siesta operations.
#[derive(Error, Debug)]
pub enum SiestaError {
    /// Malformed template or chain syntax.
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A chain names a filter that is not registered.
    #[error("unknown filter '{name}' on line {line}")]
    UnknownFilter { name: String, line: usize },

    /// A filter was given arguments its contract does not accept.
    #[error("invalid arguments for filter '{filter}' on line {line}: {message}")]
    InvalidArguments {
        filter: String,
        line: usize,
        message: String,
    },

    /// A filter received a value of a kind it does not accept.
    #[error("filter '{filter}' expects {expected}, got {found}")]
    TypeMismatch {
        filter: String,
        expected: String,
        found: String,
    },

    /// A variable reference with no binding in scope.
    #[error("undefined variable '{name}' on line {line}")]
    UndefinedVariable { name: String, line: usize },

    /// An external command exited non-zero or could not be started.
    #[error("command failed{}: {command}{}", exit_suffix(.exit_code), stderr_suffix(.stderr))]
    Command {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The LLM provider could not produce a completion.
    #[error("completion failed for model '{model}': {message}")]
    Completion { model: String, message: String },

    /// Structured-data input could not be parsed.
    #[error("invalid JSON: {0}")]
    Parse(String),

    /// A file named by a script step does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The user aborted an interactive step.
    #[error("cancelled by user in '{0}'")]
    UserCancelled(String),

    /// No script matches the requested name.
    #[error("script '{name}' not found\nFix: run `siesta list` to see scripts in {searched}.")]
    ScriptNotFound { name: String, searched: String },

    /// Configuration could not be loaded or is invalid.
    #[error("{0}")]
    Config(String),

    /// Filesystem or terminal I/O failure.
    #[error("{0}")]
    Io(String),

    /// The `debug` filter stopped the run on purpose. Not a failure.
    #[error("debug halt")]
    DebugHalt(String),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {})", code),
        None => String::new(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}

impl SiestaError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SiestaError::DebugHalt(_) => exit_codes::SUCCESS,
            SiestaError::Command { .. } => exit_codes::COMMAND_FAILURE,
            SiestaError::Completion { .. } => exit_codes::COMPLETION_FAILURE,
            SiestaError::UserCancelled(_) => exit_codes::USER_CANCELLED,
            SiestaError::Syntax { .. }
            | SiestaError::UnknownFilter { .. }
            | SiestaError::InvalidArguments { .. }
            | SiestaError::TypeMismatch { .. }
            | SiestaError::UndefinedVariable { .. }
            | SiestaError::Parse(_)
            | SiestaError::FileNotFound(_)
            | SiestaError::ScriptNotFound { .. }
            | SiestaError::Config(_)
            | SiestaError::Io(_) => exit_codes::SCRIPT_ERROR,
        }
    }

    /// Whether this error should be reported as a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, SiestaError::DebugHalt(_))
    }
}

/// Result type alias for siesta operations.
pub type Result<T> = std::result::Result<T, SiestaError>;
