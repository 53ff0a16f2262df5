//! Exit code constants for the siesta CLI.
//!
//! - 0: Success (including a `debug` halt)
//! - 1: Script error (syntax, unknown filter, undefined variable, config, io)
//! - 2: A shell command exited non-zero or could not be spawned
//! - 3: LLM completion failure
//! - 130: The user cancelled an interactive step

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Script authoring, configuration, or usage error.
pub const SCRIPT_ERROR: i32 = 1;

/// External command failure.
pub const COMMAND_FAILURE: i32 = 2;

/// LLM completion failure (transport, auth, rate limit, bad response).
pub const COMPLETION_FAILURE: i32 = 3;

/// Interactive step aborted by the user, matching the shell's SIGINT convention.
pub const USER_CANCELLED: i32 = 130;
