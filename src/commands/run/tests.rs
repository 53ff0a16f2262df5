use super::*;
use crate::exit_codes;
use crate::journal::read_entries;
use crate::test_support::{DirGuard, TestRuntime};
use serial_test::serial;
use tempfile::TempDir;

const COMMIT_SCRIPT: &str = r#"#!/usr/bin/env -S siesta run
{% set commit|prompt("model-x") %}
Write a commit message for this diff:
{% filter run(label=True) %}git diff{% endfilter %}
{% endset %}
{% filter run %}git commit -am {{ commit|askedit|quote }}{% endfilter %}
"#;

fn script() -> &'static Path {
    Path::new("commit")
}

#[test]
fn test_finalize_strips_shebang_and_newlines() {
    assert_eq!(finalize_output("#!/usr/bin/env siesta\n\nhello\n\n"), "hello");
    assert_eq!(finalize_output("\nno shebang\nhere\n"), "no shebang\nhere");
    assert_eq!(finalize_output("#!only"), "");
    assert_eq!(finalize_output("  keep spaces  \n"), "  keep spaces  ");
}

#[test]
fn test_commit_scenario_completes() {
    let mut t = TestRuntime::new();
    t.shell.ok("git diff", "diff text");
    t.shell.ok("git commit -am 'Fix bug'", "[main abc123] Fix bug\n");

    let outcome = run_source(COMMIT_SCRIPT, script(), &[], &mut t.runtime).unwrap();

    assert_eq!(outcome, Outcome::Completed("[main abc123] Fix bug".to_string()));
    assert_eq!(
        t.shell.executed().last().map(String::as_str),
        Some("git commit -am 'Fix bug'")
    );
}

#[test]
fn test_commit_scenario_fails_when_commit_fails() {
    let mut t = TestRuntime::new();
    t.shell.ok("git diff", "diff text");
    t.shell.fail("git commit -am 'Fix bug'", 1, "nothing to commit");

    let err = run_source(COMMIT_SCRIPT, script(), &[], &mut t.runtime).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::COMMAND_FAILURE);
}

#[test]
fn test_failing_diff_never_prompts() {
    let mut t = TestRuntime::new();
    t.shell.fail("git diff", 1, "");

    let err = run_source(COMMIT_SCRIPT, script(), &[], &mut t.runtime).unwrap_err();
    assert_ne!(err.exit_code(), exit_codes::SUCCESS);
    assert!(t.completion.prompts().is_empty());
}

#[test]
fn test_cancelled_edit_exit_code() {
    let mut t = TestRuntime::new();
    t.ui.queue_edit(None);

    let err = run_source(COMMIT_SCRIPT, script(), &[], &mut t.runtime).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_CANCELLED);
    assert_eq!(t.shell.executed(), vec!["git diff".to_string()]);
}

#[test]
fn test_completion_failure_exit_code() {
    let mut t = TestRuntime::failing_completion("401 Unauthorized");
    let err = run_source(COMMIT_SCRIPT, script(), &[], &mut t.runtime).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::COMPLETION_FAILURE);
}

#[test]
fn test_debug_halt_is_success() {
    let mut t = TestRuntime::new();
    let outcome = run_source(
        "{% set x = input %}{{ x|debug }}\n{% filter run %}never{% endfilter %}",
        script(),
        &["a".to_string(), "b".to_string()],
        &mut t.runtime,
    )
    .unwrap();

    assert_eq!(outcome, Outcome::Halted("a b".to_string()));
    assert!(t.shell.executed().is_empty());
}

#[test]
fn test_unknown_filter_runs_nothing() {
    let mut t = TestRuntime::new();
    let err = run_source(
        "{% filter run %}rm -rf build{% endfilter %}\n{{ input|shout }}",
        script(),
        &[],
        &mut t.runtime,
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), exit_codes::SCRIPT_ERROR);
    assert!(t.shell.executed().is_empty());
}

#[test]
fn test_undefined_variable_runs_nothing() {
    let mut t = TestRuntime::new();
    let err = run_source(
        "{% filter run %}make{% endfilter %}{{ commit }}",
        script(),
        &[],
        &mut t.runtime,
    )
    .unwrap_err();

    assert!(matches!(err, SiestaError::UndefinedVariable { .. }));
    assert!(t.shell.executed().is_empty());
}

#[test]
fn test_journal_records_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("journal.ndjson");
    let mut t = TestRuntime::new();
    t.enable_journal(path.clone());
    t.shell.ok("git diff", "diff text");

    run_source(COMMIT_SCRIPT, script(), &["x".to_string()], &mut t.runtime).unwrap();

    let actions: Vec<_> = read_entries(&path)
        .unwrap()
        .into_iter()
        .map(|e| (e.action, e.filter))
        .collect();
    assert_eq!(
        actions,
        vec![
            (JournalAction::ScriptStart, None),
            (JournalAction::Effect, Some("run".to_string())),
            (JournalAction::Effect, Some("prompt".to_string())),
            (JournalAction::Effect, Some("askedit".to_string())),
            (JournalAction::Effect, Some("run".to_string())),
            (JournalAction::ScriptFinish, None),
        ]
    );
}

#[test]
fn test_journal_records_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("journal.ndjson");
    let mut t = TestRuntime::new();
    t.enable_journal(path.clone());
    t.shell.fail("git diff", 128, "fatal");

    run_source(COMMIT_SCRIPT, script(), &[], &mut t.runtime).unwrap_err();

    let entries = read_entries(&path).unwrap();
    let last = entries.last().unwrap();
    assert_eq!(last.action, JournalAction::ScriptFail);
    assert_eq!(last.details["exit_code"], exit_codes::COMMAND_FAILURE);
}

#[test]
fn test_read_script_missing() {
    let dir = TempDir::new().unwrap();
    let err = read_script(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, SiestaError::FileNotFound(_)));
}

#[test]
#[serial]
fn test_run_script_resolves_paths_against_working_directory() {
    let dir = TempDir::new().unwrap();
    let _guard = DirGuard::new(dir.path());
    fs::write(
        dir.path().join("greet"),
        "#!/usr/bin/env -S siesta run\n{{ input|quote|write('out.txt') }}\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.cache.path = Some(dir.path().join("cache.json"));
    config.journal.enabled = true;
    config.journal.path = Some(dir.path().join("journal.ndjson"));

    run_script(&config, Path::new("greet"), &["hi there".to_string()]).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "'hi there'"
    );
    let entries = read_entries(&dir.path().join("journal.ndjson")).unwrap();
    assert_eq!(entries[0].script, "greet");
    assert_eq!(entries.last().unwrap().action, JournalAction::ScriptFinish);
}
