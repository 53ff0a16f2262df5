//! File filters: `catfiles`, `read`, `write`, `append`.
//!
//! Relative paths resolve against the runtime's base directory. Labels carry
//! the path exactly as the script wrote it.

use super::FilterArgs;
use crate::error::{Result, SiestaError};
use crate::fs::atomic_write;
use crate::runtime::Runtime;
use crate::value::{Section, Value};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};

fn read_file(path: &str, rt: &Runtime) -> Result<String> {
    let full = rt.resolve_path(path);
    fs::read_to_string(&full).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SiestaError::FileNotFound(path.to_string()),
        _ => SiestaError::Io(format!("failed to read '{}': {}", full.display(), e)),
    })
}

/// Read every whitespace-separated path into one labelled section each.
pub(super) fn catfiles(input: Value, rt: &mut Runtime) -> Result<Value> {
    let text = input.as_text();
    let sections = text
        .split_whitespace()
        .map(|path| Ok(Section::new(path, read_file(path, rt)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::sections(sections))
}

pub(super) fn read(input: Value, rt: &mut Runtime) -> Result<Value> {
    let path = input.as_text().trim().to_string();
    let content = read_file(&path, rt)?;
    Ok(Value::text(content).with_label(path))
}

fn target(args: &FilterArgs) -> Result<&str> {
    // Bound as required, so absence means the registry and binder disagree.
    args.str("path")
        .ok_or_else(|| SiestaError::Io("missing 'path' argument".to_string()))
}

pub(super) fn write(input: Value, args: &FilterArgs, rt: &mut Runtime) -> Result<Value> {
    let path = rt.resolve_path(target(args)?);
    atomic_write(&path, input.as_text().as_bytes())?;
    tracing::debug!(path = %path.display(), "wrote file");
    Ok(Value::text(""))
}

pub(super) fn append(input: Value, args: &FilterArgs, rt: &mut Runtime) -> Result<Value> {
    let path = rt.resolve_path(target(args)?);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| SiestaError::Io(format!("failed to open '{}': {}", path.display(), e)))?;
    file.write_all(input.as_text().as_bytes())
        .map_err(|e| SiestaError::Io(format!("failed to append to '{}': {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "appended to file");
    Ok(Value::text(""))
}
