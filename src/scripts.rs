//! Script discovery.
//!
//! Scripts live in the directories of the search path (see
//! `Config::script_search_path`). Any regular, non-hidden file whose name
//! matches one of the configured glob patterns is a script; its name is the
//! file stem. When two directories hold a script of the same name, the one
//! found first wins.

use crate::error::{Result, SiestaError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub path: PathBuf,
}

impl Script {
    fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_stem()?.to_string_lossy().to_string();
        Some(Self { name, path })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            SiestaError::Config(format!("invalid script pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SiestaError::Config(format!("failed to compile script patterns: {}", e)))
}

/// All scripts in `dirs`, sorted by name. Missing directories are skipped.
pub fn discover(dirs: &[PathBuf], patterns: &[String]) -> Result<Vec<Script>> {
    let globs = build_globset(patterns)?;
    let mut seen = HashSet::new();
    let mut scripts = Vec::new();

    for dir in dirs {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(SiestaError::Io(format!(
                    "failed to read script directory '{}': {}",
                    dir.display(),
                    e
                )));
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_candidate(path, &globs))
            .collect();
        paths.sort();

        for script in paths.into_iter().filter_map(Script::from_path) {
            if seen.insert(script.name.clone()) {
                scripts.push(script);
            } else {
                tracing::debug!(path = %script.path.display(), "shadowed by an earlier script of the same name");
            }
        }
    }

    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

fn is_candidate(path: &Path, globs: &GlobSet) -> bool {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    !file_name.starts_with('.') && globs.is_match(&*file_name) && path.is_file()
}

/// Resolve a script by path or by name.
///
/// An argument naming an existing file is loaded directly; anything else is
/// looked up by name in `dirs`.
pub fn resolve(target: &str, dirs: &[PathBuf], patterns: &[String]) -> Result<Script> {
    let direct = Path::new(target);
    if direct.is_file()
        && let Some(script) = Script::from_path(direct.to_path_buf())
    {
        return Ok(script);
    }

    discover(dirs, patterns)?
        .into_iter()
        .find(|script| script.name == target)
        .ok_or_else(|| SiestaError::ScriptNotFound {
            name: target.to_string(),
            searched: describe_dirs(dirs),
        })
}

fn describe_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "(no script directories configured)".to_string();
    }
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
