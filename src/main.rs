//! Siesta: template-driven workflow executor.
//!
//! This is the main entry point for the `siesta` CLI. It parses arguments,
//! sets up logging, dispatches to the appropriate command handler, and handles
//! errors with proper exit codes.

mod backend;
mod cli;
mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
mod filters;
pub mod fs;
mod journal;
mod logging;
mod runtime;
mod scripts;
mod template;
mod value;

#[cfg(test)]
mod test_support;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version text go to stdout, usage errors to stderr.
            let _ = err.print();
            return ExitCode::from(cli::usage_exit_code(&err) as u8);
        }
    };
    logging::init(cli.verbose);

    match commands::dispatch(cli.command, cli.config.as_deref()) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            if err.is_failure() {
                // Print user-actionable error message to stderr
                eprintln!("Error: {}", err);
            }
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
