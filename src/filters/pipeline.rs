//! Chain evaluation.
//!
//! [`apply`] folds a chain over a value: each filter's output is the next
//! filter's input. The first failure aborts the rest of the chain; nothing is
//! retried and no partial result escapes.

use super::{Chain, FilterCall, FilterKind, InputKind, LabelRule, SideEffect};
use crate::error::{Result, SiestaError};
use crate::runtime::Runtime;
use crate::value::Value;
use serde_json::json;
use std::time::Instant;

/// Longest command or prompt excerpt written to the journal.
const DETAIL_LIMIT: usize = 200;

/// Apply every call of `chain` to `value`, left to right.
pub fn apply(value: Value, chain: &Chain, rt: &mut Runtime) -> Result<Value> {
    chain
        .calls
        .iter()
        .try_fold(value, |value, call| apply_call(value, call, rt))
}

fn apply_call(value: Value, call: &FilterCall, rt: &mut Runtime) -> Result<Value> {
    let contract = call.kind.contract();

    if contract.input == InputKind::Text && !value.is_textual() {
        return Err(SiestaError::TypeMismatch {
            filter: contract.name.to_string(),
            expected: "text".to_string(),
            found: value.kind().to_string(),
        });
    }

    if !matches!(contract.side_effect, SideEffect::Pure | SideEffect::Terminating)
        && let Some(journal) = &rt.journal
    {
        journal.record_effect(contract.name, effect_details(call, &value))?;
    }

    let started = Instant::now();
    let incoming_label = value.label.clone();
    let mut output = call.kind.invoke(value, &call.args, rt)?;

    match contract.label {
        LabelRule::Preserve => output.label = incoming_label,
        LabelRule::Strip => output.label = None,
        LabelRule::Replace => {}
    }

    tracing::debug!(
        filter = contract.name,
        effect = ?contract.side_effect,
        line = call.line,
        output = output.kind(),
        labelled = output.label.is_some(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "filter applied"
    );
    Ok(output)
}

fn effect_details(call: &FilterCall, input: &Value) -> serde_json::Value {
    let excerpt = || truncate(&input.as_text());
    match call.kind {
        FilterKind::Run | FilterKind::Askrun => json!({ "command": excerpt() }),
        FilterKind::Prompt => json!({
            "model": call.args.str("model"),
            "prompt_chars": input.as_text().chars().count(),
        }),
        FilterKind::Catfiles | FilterKind::Read => json!({ "paths": excerpt() }),
        FilterKind::Write | FilterKind::Append => json!({ "path": call.args.str("path") }),
        _ => json!({}),
    }
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(DETAIL_LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ExecOutput;
    use crate::filters::RawArgs;
    use crate::filters::args::ArgValue;
    use crate::journal::{JournalAction, read_entries};
    use crate::test_support::TestRuntime;
    use tempfile::TempDir;

    fn call(name: &str, keyword: Vec<(&str, ArgValue)>) -> FilterCall {
        let raw = RawArgs {
            positional: vec![],
            keyword: keyword
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        };
        FilterCall::resolve(name, raw, 1).unwrap()
    }

    fn chain(calls: Vec<FilterCall>) -> Chain {
        Chain { calls }
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut t = TestRuntime::new();
        let value = Value::text("x").with_label("src");
        let out = apply(value.clone(), &Chain::default(), &mut t.runtime).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_outputs_feed_next_filter() {
        let mut t = TestRuntime::new();
        let c = chain(vec![call("code", vec![]), call("quote", vec![])]);
        let out = apply(
            Value::text("Try:\n```sh\necho it's\n```\n"),
            &c,
            &mut t.runtime,
        )
        .unwrap();
        assert_eq!(out.as_text(), r#"'echo it'\''s'"#);
    }

    #[test]
    fn test_sequential_application_is_associative() {
        let mut t = TestRuntime::new();
        t.shell.respond("printf '{\"a\": 1}'", ExecOutput {
            stdout: "{\"a\": 1}".to_string(),
            exit_code: Some(0),
            ..Default::default()
        });
        let c = chain(vec![
            call("run", vec![("label", ArgValue::Bool(true))]),
            call("print", vec![]),
            call("json", vec![]),
        ]);
        let input = Value::text("printf '{\"a\": 1}'");

        let whole = apply(input.clone(), &c, &mut t.runtime).unwrap();
        let head = apply(input, &c.prefix(2), &mut t.runtime).unwrap();
        let stepwise = apply(head, &c.suffix(2), &mut t.runtime).unwrap();

        assert_eq!(whole, stepwise);
        assert_eq!(whole, Value::data(serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_failure_short_circuits_rest_of_chain() {
        let mut t = TestRuntime::new();
        t.shell.respond("false", ExecOutput {
            exit_code: Some(1),
            stderr: "boom".to_string(),
            ..Default::default()
        });
        let c = chain(vec![call("run", vec![]), call("prompt", vec![("model", ArgValue::Str("m".into()))])]);

        let err = apply(Value::text("false"), &c, &mut t.runtime).unwrap_err();
        assert!(matches!(err, SiestaError::Command { exit_code: Some(1), .. }));
        assert!(t.completion.prompts().is_empty());
    }

    #[test]
    fn test_text_filter_rejects_structured_data() {
        let mut t = TestRuntime::new();
        let c = chain(vec![call("quote", vec![])]);
        let err = apply(Value::data(serde_json::json!({"a": 1})), &c, &mut t.runtime).unwrap_err();
        assert_eq!(err.to_string(), "filter 'quote' expects text, got a JSON object");
    }

    #[test]
    fn test_text_filter_accepts_json_scalar() {
        let mut t = TestRuntime::new();
        let c = chain(vec![call("quote", vec![])]);
        let out = apply(Value::data(serde_json::json!("Fix bug")), &c, &mut t.runtime).unwrap();
        assert_eq!(out.as_text(), "'Fix bug'");
    }

    #[test]
    fn test_label_rules() {
        let mut t = TestRuntime::new();
        let labelled = Value::text("a b").with_label("origin");

        // Preserve
        let out = apply(labelled.clone(), &chain(vec![call("print", vec![])]), &mut t.runtime).unwrap();
        assert_eq!(out.label.as_deref(), Some("origin"));

        // Strip
        let out = apply(labelled.clone(), &chain(vec![call("quote", vec![])]), &mut t.runtime).unwrap();
        assert_eq!(out.label, None);

        // Replace
        t.shell.respond("a b", ExecOutput {
            stdout: "ok\n".to_string(),
            exit_code: Some(0),
            ..Default::default()
        });
        let out = apply(
            labelled,
            &chain(vec![call("run", vec![("label", ArgValue::Bool(true))])]),
            &mut t.runtime,
        )
        .unwrap();
        assert_eq!(out.label.as_deref(), Some("a b"));
    }

    #[test]
    fn test_side_effects_are_journaled() {
        let dir = TempDir::new().unwrap();
        let mut t = TestRuntime::new();
        t.enable_journal(dir.path().join("journal.ndjson"));

        let c = chain(vec![call("quote", vec![]), call("run", vec![])]);
        apply(Value::text("echo hi"), &c, &mut t.runtime).unwrap();

        let entries = read_entries(&dir.path().join("journal.ndjson")).unwrap();
        assert_eq!(entries.len(), 1, "pure filters are not journaled");
        assert_eq!(entries[0].action, JournalAction::Effect);
        assert_eq!(entries[0].filter.as_deref(), Some("run"));
        assert_eq!(entries[0].details["command"], "'echo hi'");
    }

    #[test]
    fn test_prompt_effect_counts_characters() {
        let dir = TempDir::new().unwrap();
        let mut t = TestRuntime::new();
        t.enable_journal(dir.path().join("journal.ndjson"));

        let c = chain(vec![call("prompt", vec![("model", ArgValue::Str("m".into()))])]);
        apply(Value::text("héllo wörld ✓"), &c, &mut t.runtime).unwrap();

        let entries = read_entries(&dir.path().join("journal.ndjson")).unwrap();
        assert_eq!(entries[0].filter.as_deref(), Some("prompt"));
        assert_eq!(entries[0].details["model"], "m");
        assert_eq!(entries[0].details["prompt_chars"], 13);
    }

    #[test]
    fn test_truncate_long_details() {
        let long = "x".repeat(500);
        let short = truncate(&long);
        assert_eq!(short.len(), DETAIL_LIMIT + 3);
        assert!(short.ends_with("..."));
        assert_eq!(truncate("  short  "), "short");
    }
}
