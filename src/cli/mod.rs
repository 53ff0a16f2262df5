//! CLI argument parsing for siesta.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::exit_codes;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Siesta: run text templates that mix shell commands, LLM prompts and
/// interactive edits.
///
/// Every script in the script directories is available as a subcommand:
/// `siesta commit` renders the script named `commit`. A path to an existing
/// file works too.
#[derive(Parser, Debug)]
#[command(name = "siesta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `SIESTA_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to the config file (default: $SIESTA_CONFIG or
    /// ~/.config/siesta/config.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for siesta.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a script file given by path.
    ///
    /// Suited to shebang lines: `#!/usr/bin/env -S siesta run`.
    Run(RunArgs),

    /// List the scripts found in the script directories.
    List,

    /// Parse and validate a script without running anything.
    ///
    /// Reports unknown filters, bad filter arguments, syntax errors and
    /// variables used before they are bound.
    Check(CheckArgs),

    /// Any other subcommand names a script: `siesta <script> [ARGS...]`.
    #[command(external_subcommand)]
    Script(Vec<String>),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Script file to render.
    pub script: PathBuf,

    /// Arguments passed to the script (available as `argv` and `input`).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Script name or path.
    pub script: String,
}

/// Exit code for a failed parse. Help and version requests succeed; every
/// usage error is a script error, keeping exit code 2 for failed commands.
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
        _ => exit_codes::SCRIPT_ERROR,
    }
}
