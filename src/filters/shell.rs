//! `run` and `askrun`: execute the value as command source.

use super::FilterArgs;
use crate::backend::{Choice, ExecRequest};
use crate::error::{Result, SiestaError};
use crate::runtime::Runtime;
use crate::value::Value;

/// Command source with surrounding spaces and newlines removed, as written
/// between `{% filter run %}` and `{% endfilter %}`.
fn command_source(input: &Value) -> String {
    input.as_text().trim_matches([' ', '\n']).to_string()
}

fn execute(source: &str, args: &FilterArgs, rt: &mut Runtime) -> Result<ExecOutcome> {
    let interpreter = args.str("cmd").unwrap_or(&rt.interpreter).to_string();
    tracing::info!(interpreter = %interpreter, command = %source, "running command");

    let output = rt.shell.exec(&ExecRequest {
        interpreter,
        source: source.to_string(),
    })?;

    if output.success() {
        Ok(ExecOutcome::Success(output.stdout))
    } else {
        Ok(ExecOutcome::Failed(SiestaError::Command {
            command: source.to_string(),
            exit_code: output.exit_code,
            stderr: output.stderr,
        }))
    }
}

enum ExecOutcome {
    Success(String),
    Failed(SiestaError),
}

pub(super) fn run(input: Value, args: &FilterArgs, rt: &mut Runtime) -> Result<Value> {
    let source = command_source(&input);

    let stdout = match execute(&source, args, rt)? {
        ExecOutcome::Success(stdout) => stdout,
        ExecOutcome::Failed(err) if args.flag("silentfail") => {
            tracing::warn!(error = %err, "command failed, continuing with empty output");
            String::new()
        }
        ExecOutcome::Failed(err) => return Err(err),
    };

    let output = Value::text(stdout);
    Ok(if args.flag("label") {
        output.with_label(source)
    } else {
        output
    })
}

pub(super) fn askrun(input: Value, args: &FilterArgs, rt: &mut Runtime) -> Result<Value> {
    let mut source = command_source(&input);

    loop {
        match rt.interaction.confirm(&source)? {
            Choice::Execute => break,
            Choice::Edit => match rt.interaction.edit(&source)? {
                Some(edited) => source = edited.trim_matches([' ', '\n']).to_string(),
                None => return Err(SiestaError::UserCancelled("askrun".to_string())),
            },
            Choice::Quit => return Err(SiestaError::UserCancelled("askrun".to_string())),
        }
    }

    match execute(&source, args, rt)? {
        ExecOutcome::Success(stdout) => Ok(Value::text(stdout)),
        ExecOutcome::Failed(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ExecOutput;
    use crate::filters::args::{ArgValue, RawArgs};
    use crate::filters::FilterCall;
    use crate::test_support::TestRuntime;

    fn args(name: &str, keyword: Vec<(&str, ArgValue)>) -> FilterArgs {
        let raw = RawArgs {
            positional: vec![],
            keyword: keyword
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        };
        FilterCall::resolve(name, raw, 1).unwrap().args
    }

    #[test]
    fn test_run_returns_stdout() {
        let mut t = TestRuntime::new();
        t.shell.ok("echo hi", "hi\n");
        let out = run(Value::text("echo hi"), &args("run", vec![]), &mut t.runtime).unwrap();
        assert_eq!(out, Value::text("hi\n"));
    }

    #[test]
    fn test_run_label_is_command_source() {
        let mut t = TestRuntime::new();
        t.shell.ok("echo hi", "hi\n");
        let out = run(
            Value::text("\n  echo hi \n"),
            &args("run", vec![("label", ArgValue::Bool(true))]),
            &mut t.runtime,
        )
        .unwrap();
        assert_eq!(out.label.as_deref(), Some("echo hi"));
        assert_eq!(out.as_text(), "hi\n");
        assert_eq!(out.render(), "=== echo hi ===\nhi\n======\n");
    }

    #[test]
    fn test_run_uses_default_and_custom_interpreter() {
        let mut t = TestRuntime::new();
        run(Value::text("echo a"), &args("run", vec![]), &mut t.runtime).unwrap();
        run(
            Value::text("print(1)"),
            &args("run", vec![("cmd", ArgValue::Str("python3".into()))]),
            &mut t.runtime,
        )
        .unwrap();

        let requests = t.shell.requests();
        assert_eq!(requests[0].interpreter, "bash");
        assert_eq!(requests[1].interpreter, "python3");
        assert_eq!(requests[1].source, "print(1)");
    }

    #[test]
    fn test_run_nonzero_exit_is_command_error() {
        let mut t = TestRuntime::new();
        t.shell.fail("git diff", 1, "fatal: bad revision");
        let err = run(Value::text("git diff"), &args("run", vec![]), &mut t.runtime).unwrap_err();
        match err {
            SiestaError::Command {
                command,
                exit_code,
                stderr,
            } => {
                assert_eq!(command, "git diff");
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "fatal: bad revision");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_run_silentfail_yields_empty_text() {
        let mut t = TestRuntime::new();
        t.shell.fail("grep nothing file", 1, "");
        let out = run(
            Value::text("grep nothing file"),
            &args("run", vec![("silentfail", ArgValue::Bool(true))]),
            &mut t.runtime,
        )
        .unwrap();
        assert_eq!(out, Value::text(""));
    }

    #[test]
    fn test_askrun_executes_on_confirm() {
        let mut t = TestRuntime::new();
        t.shell.ok("ls", "a\nb\n");
        t.ui.queue_choice(Choice::Execute);
        let out = askrun(Value::text("ls\n"), &args("askrun", vec![]), &mut t.runtime).unwrap();
        assert_eq!(out.as_text(), "a\nb\n");
        assert_eq!(t.ui.confirmed(), vec!["ls".to_string()]);
    }

    #[test]
    fn test_askrun_edit_then_execute() {
        let mut t = TestRuntime::new();
        t.shell.ok("ls -la", "total 0\n");
        t.ui.queue_choice(Choice::Edit);
        t.ui.queue_edit(Some("ls -la\n"));
        t.ui.queue_choice(Choice::Execute);

        let out = askrun(Value::text("ls"), &args("askrun", vec![]), &mut t.runtime).unwrap();
        assert_eq!(out.as_text(), "total 0\n");
        assert_eq!(t.ui.confirmed(), vec!["ls".to_string(), "ls -la".to_string()]);
        assert_eq!(t.shell.executed(), vec!["ls -la".to_string()]);
    }

    #[test]
    fn test_askrun_quit_cancels_without_running() {
        let mut t = TestRuntime::new();
        t.ui.queue_choice(Choice::Quit);
        let err = askrun(Value::text("rm -rf build"), &args("askrun", vec![]), &mut t.runtime)
            .unwrap_err();
        assert!(matches!(err, SiestaError::UserCancelled(_)));
        assert!(t.shell.executed().is_empty());
    }

    #[test]
    fn test_askrun_aborted_edit_cancels() {
        let mut t = TestRuntime::new();
        t.ui.queue_choice(Choice::Edit);
        t.ui.queue_edit(None);
        let err = askrun(Value::text("ls"), &args("askrun", vec![]), &mut t.runtime).unwrap_err();
        assert!(matches!(err, SiestaError::UserCancelled(_)));
    }

    #[test]
    fn test_askrun_failure_propagates() {
        let mut t = TestRuntime::new();
        t.shell.respond("make", ExecOutput {
            exit_code: Some(2),
            stderr: "no rule".to_string(),
            ..Default::default()
        });
        t.ui.queue_choice(Choice::Execute);
        let err = askrun(Value::text("make"), &args("askrun", vec![]), &mut t.runtime).unwrap_err();
        assert!(matches!(err, SiestaError::Command { exit_code: Some(2), .. }));
    }
}
