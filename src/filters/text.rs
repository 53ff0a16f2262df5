//! Text transforms and user-facing filters: `code`, `quote`, `json`,
//! `askedit`, `print`, `debug`.

use crate::error::{Result, SiestaError};
use crate::runtime::Runtime;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

/// A fenced block: opening fence with optional info string, body, closing fence.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[^\n`]*\n(.*?)```").expect("valid fenced block regex"));

/// Keep only the bodies of fenced code blocks, joined by newlines.
pub(super) fn code(input: Value) -> Value {
    let text = input.as_text();
    let blocks: Vec<&str> = FENCED_BLOCK
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str().strip_suffix('\n').unwrap_or(body.as_str()))
        .collect();
    Value::text(blocks.join("\n"))
}

/// Escape for safe interpolation into a POSIX shell command line.
pub(super) fn quote(input: Value) -> Value {
    Value::text(shell_words::quote(&input.as_text()).into_owned())
}

pub(super) fn json(input: Value) -> Result<Value> {
    serde_json::from_str(&input.as_text())
        .map(Value::data)
        .map_err(|e| SiestaError::Parse(e.to_string()))
}

pub(super) fn askedit(input: Value, rt: &mut Runtime) -> Result<Value> {
    match rt.interaction.edit(&input.as_text())? {
        Some(edited) => Ok(Value::text(edited)),
        None => Err(SiestaError::UserCancelled("askedit".to_string())),
    }
}

pub(super) fn print(input: Value, rt: &mut Runtime) -> Result<Value> {
    rt.interaction.show(&input.render())?;
    Ok(input)
}

/// Stop the run, carrying the value's textual form to the driver.
pub(super) fn debug(input: Value) -> SiestaError {
    SiestaError::DebugHalt(input.render())
}
