//! Command implementations for siesta.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod run;

use crate::cli::{CheckArgs, Command, RunArgs};
use crate::config::{Config, SCRIPT_PATH_ENV};
use crate::error::{Result, SiestaError};
use crate::filters::SideEffect;
use crate::scripts::{self, Script};
use crate::template::{self, SEEDED};
use std::path::Path;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_effective(config_path)?;
    config.validate()?;

    match command {
        Command::Run(args) => cmd_run(&config, args),
        Command::List => cmd_list(&config),
        Command::Check(args) => cmd_check(&config, args),
        Command::Script(argv) => cmd_script(&config, argv),
    }
}

fn find_script(config: &Config, target: &str) -> Result<Script> {
    let dirs = config.script_search_path(std::env::var_os(SCRIPT_PATH_ENV));
    scripts::resolve(target, &dirs, &config.script_patterns)
}

fn cmd_run(config: &Config, args: RunArgs) -> Result<()> {
    run::run_script(config, &args.script, &args.args)
}

fn cmd_script(config: &Config, argv: Vec<String>) -> Result<()> {
    let Some((name, args)) = argv.split_first() else {
        return Err(SiestaError::Config("no script given".to_string()));
    };
    let script = find_script(config, name)?;
    tracing::debug!(name = %script.name, path = %script.path.display(), "resolved script");
    run::run_script(config, &script.path, args)
}

fn cmd_list(config: &Config) -> Result<()> {
    let dirs = config.script_search_path(std::env::var_os(SCRIPT_PATH_ENV));
    let found = scripts::discover(&dirs, &config.script_patterns)?;

    if found.is_empty() {
        eprintln!("No scripts found. Searched:");
        for dir in &dirs {
            eprintln!("  {}", dir.display());
        }
        return Ok(());
    }

    let width = found.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for script in &found {
        println!("{:width$}  {}", script.name, script.path.display(), width = width);
    }
    Ok(())
}

/// What a successful `check` found in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckSummary {
    filter_calls: usize,
    side_effects: usize,
}

fn check_source(source: &str) -> Result<CheckSummary> {
    let template = template::parse(source)?;
    template::check_bindings(&template, SEEDED.iter().copied())?;

    let calls: Vec<_> = template
        .chains()
        .into_iter()
        .flat_map(|chain| chain.calls.iter())
        .collect();
    let side_effects = calls
        .iter()
        .filter(|call| call.kind.contract().side_effect != SideEffect::Pure)
        .count();

    Ok(CheckSummary {
        filter_calls: calls.len(),
        side_effects,
    })
}

fn cmd_check(config: &Config, args: CheckArgs) -> Result<()> {
    let script = find_script(config, &args.script)?;
    let source = run::read_script(&script.path)?;
    let summary = check_source(&source)?;

    println!(
        "{}: ok ({} filter call(s), {} with side effects)",
        script.path.display(),
        summary.filter_calls,
        summary.side_effects
    );
    Ok(())
}
