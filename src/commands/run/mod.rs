//! Script driver: load, render, print.
//!
//! The rendered output is buffered and printed only after the whole render
//! pass succeeds. A `debug` halt prints the inspected value instead and counts
//! as success.

use crate::config::Config;
use crate::error::{Result, SiestaError};
use crate::journal::{Journal, JournalAction};
use crate::runtime::Runtime;
use crate::template::{self, SEEDED, Scope};
use serde_json::json;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

/// How a script run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rendered to the end; carries the final output.
    Completed(String),
    /// Stopped by the `debug` filter; carries the inspected value.
    Halted(String),
}

/// Read a script file.
pub fn read_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SiestaError::FileNotFound(path.display().to_string()),
        _ => SiestaError::Io(format!("failed to read script '{}': {}", path.display(), e)),
    })
}

/// Parse, check and render `source`, returning the final output.
pub fn execute(source: &str, script: &Path, args: &[String], rt: &mut Runtime) -> Result<String> {
    let template = template::parse(source)?;
    template::check_bindings(&template, SEEDED.iter().copied())?;
    tracing::debug!(script = %script.display(), nodes = template.len(), "parsed script");

    let scope = Scope::seeded(&program_name(), script, args);
    let rendered = template::render(&template, scope, rt)?;
    Ok(finalize_output(&rendered))
}

/// The name this process was invoked as, which scripts see as `argv.0`.
fn program_name() -> String {
    std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Drop a leading `#!` line and surrounding newlines.
pub fn finalize_output(rendered: &str) -> String {
    let body = if rendered.starts_with("#!") {
        rendered.split_once('\n').map_or("", |(_, rest)| rest)
    } else {
        rendered
    };
    body.trim_matches('\n').to_string()
}

/// Run `source` with journaling around it.
pub fn run_source(source: &str, script: &Path, args: &[String], rt: &mut Runtime) -> Result<Outcome> {
    if let Some(journal) = &rt.journal {
        journal.record(JournalAction::ScriptStart, json!({ "args": args }))?;
    }

    let started = Instant::now();
    let result = execute(source, script, args, rt);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let journal = rt.journal.as_ref();
    match result {
        Ok(output) => {
            record(journal, JournalAction::ScriptFinish, json!({ "elapsed_ms": elapsed_ms }));
            tracing::debug!(elapsed_ms, "script finished");
            Ok(Outcome::Completed(output))
        }
        Err(SiestaError::DebugHalt(text)) => {
            record(journal, JournalAction::DebugHalt, json!({ "elapsed_ms": elapsed_ms }));
            Ok(Outcome::Halted(text))
        }
        Err(err) => {
            record(
                journal,
                JournalAction::ScriptFail,
                json!({ "error": err.to_string(), "exit_code": err.exit_code() }),
            );
            Err(err)
        }
    }
}

/// Record an end-of-run entry. The run already has its result, so a journal
/// failure here is only reported.
fn record(journal: Option<&Journal>, action: JournalAction, details: serde_json::Value) {
    if let Some(journal) = journal
        && let Err(e) = journal.record(action, details)
    {
        tracing::warn!(error = %e, "failed to write journal entry");
    }
}

/// Run the script at `path` with production backends and print its output.
pub fn run_script(config: &Config, path: &Path, args: &[String]) -> Result<()> {
    let source = read_script(path)?;
    let base_dir = std::env::current_dir()
        .map_err(|e| SiestaError::Io(format!("failed to determine working directory: {}", e)))?;

    let mut rt = Runtime::from_config(config, &base_dir)?;
    if config.journal.enabled
        && let Some(journal_path) = config.journal_path()
    {
        rt.journal = Some(Journal::new(journal_path, path));
    }

    match run_source(&source, path, args, &mut rt)? {
        Outcome::Completed(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Outcome::Halted(text) => {
            println!("{}", text);
            eprintln!("(stopped by debug filter)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
