//! Scripted backends for tests.
//!
//! Each stub is a cheap handle over shared state: one clone goes into the
//! [`Runtime`], the test keeps another to script responses and inspect calls.

use crate::backend::{
    Choice, Completion, CompletionRequest, ExecOutput, ExecRequest, Interaction, Shell,
};
use crate::error::{Result, SiestaError};
use crate::journal::Journal;
use crate::runtime::Runtime;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{LazyLock, Mutex, MutexGuard};

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Switches the process working directory for the guard's lifetime.
pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // The working directory is process-global; hold the lock even if a
        // #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

#[derive(Default)]
struct ShellState {
    responses: HashMap<String, ExecOutput>,
    requests: Vec<ExecRequest>,
}

/// Shell that answers by command source. Unknown commands succeed silently.
#[derive(Clone, Default)]
pub(crate) struct StubShell {
    state: Rc<RefCell<ShellState>>,
}

impl StubShell {
    pub(crate) fn respond(&self, source: &str, output: ExecOutput) {
        self.state
            .borrow_mut()
            .responses
            .insert(source.to_string(), output);
    }

    pub(crate) fn ok(&self, source: &str, stdout: &str) {
        self.respond(source, ExecOutput {
            stdout: stdout.to_string(),
            exit_code: Some(0),
            ..Default::default()
        });
    }

    pub(crate) fn fail(&self, source: &str, exit_code: i32, stderr: &str) {
        self.respond(source, ExecOutput {
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
            ..Default::default()
        });
    }

    pub(crate) fn requests(&self) -> Vec<ExecRequest> {
        self.state.borrow().requests.clone()
    }

    /// Command sources in execution order.
    pub(crate) fn executed(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.source).collect()
    }
}

impl Shell for StubShell {
    fn exec(&mut self, request: &ExecRequest) -> Result<ExecOutput> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());
        Ok(state
            .responses
            .get(&request.source)
            .cloned()
            .unwrap_or_else(|| ExecOutput {
                exit_code: Some(0),
                ..Default::default()
            }))
    }
}

/// Completion backend with a fixed reply, or a fixed failure.
#[derive(Clone)]
pub(crate) struct StubCompletion {
    reply: std::result::Result<String, String>,
    calls: Rc<RefCell<Vec<CompletionRequest>>>,
}

impl StubCompletion {
    pub(crate) fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Rc::default(),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Rc::default(),
        }
    }

    pub(crate) fn calls(&self) -> Rc<RefCell<Vec<CompletionRequest>>> {
        Rc::clone(&self.calls)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|r| r.prompt.clone()).collect()
    }
}

impl Completion for StubCompletion {
    fn complete(&mut self, request: &CompletionRequest) -> Result<String> {
        self.calls.borrow_mut().push(request.clone());
        self.reply.clone().map_err(|message| SiestaError::Completion {
            model: request.model.clone(),
            message,
        })
    }
}

#[derive(Default)]
struct InteractionState {
    edits: VecDeque<Option<String>>,
    choices: VecDeque<Choice>,
    edit_seeds: Vec<String>,
    confirmed: Vec<String>,
    shown: Vec<String>,
}

/// Interaction that replays queued answers.
///
/// With nothing queued, edits return the seed unchanged and confirmations
/// answer [`Choice::Execute`].
#[derive(Clone, Default)]
pub(crate) struct StubInteraction {
    state: Rc<RefCell<InteractionState>>,
}

impl StubInteraction {
    pub(crate) fn queue_edit(&self, result: Option<&str>) {
        self.state
            .borrow_mut()
            .edits
            .push_back(result.map(str::to_string));
    }

    pub(crate) fn queue_choice(&self, choice: Choice) {
        self.state.borrow_mut().choices.push_back(choice);
    }

    pub(crate) fn edit_seeds(&self) -> Vec<String> {
        self.state.borrow().edit_seeds.clone()
    }

    pub(crate) fn confirmed(&self) -> Vec<String> {
        self.state.borrow().confirmed.clone()
    }

    pub(crate) fn shown(&self) -> Vec<String> {
        self.state.borrow().shown.clone()
    }
}

impl Interaction for StubInteraction {
    fn edit(&mut self, seed: &str) -> Result<Option<String>> {
        let mut state = self.state.borrow_mut();
        state.edit_seeds.push(seed.to_string());
        Ok(state
            .edits
            .pop_front()
            .unwrap_or_else(|| Some(seed.to_string())))
    }

    fn confirm(&mut self, command: &str) -> Result<Choice> {
        let mut state = self.state.borrow_mut();
        state.confirmed.push(command.to_string());
        Ok(state.choices.pop_front().unwrap_or(Choice::Execute))
    }

    fn show(&mut self, text: &str) -> Result<()> {
        self.state.borrow_mut().shown.push(text.to_string());
        Ok(())
    }
}

/// A [`Runtime`] wired to stubs, plus the handles to drive them.
pub(crate) struct TestRuntime {
    pub(crate) runtime: Runtime,
    pub(crate) shell: StubShell,
    pub(crate) completion: StubCompletion,
    pub(crate) ui: StubInteraction,
}

impl TestRuntime {
    /// Stubs answering "Fix bug" to every prompt, rooted at the current directory.
    pub(crate) fn new() -> Self {
        Self::build(StubCompletion::new("Fix bug"), PathBuf::from("."))
    }

    pub(crate) fn with_base_dir(base_dir: &Path) -> Self {
        Self::build(StubCompletion::new("Fix bug"), base_dir.to_path_buf())
    }

    pub(crate) fn failing_completion(message: &str) -> Self {
        Self::build(StubCompletion::failing(message), PathBuf::from("."))
    }

    fn build(completion: StubCompletion, base_dir: PathBuf) -> Self {
        let shell = StubShell::default();
        let ui = StubInteraction::default();
        let runtime = Runtime {
            shell: Box::new(shell.clone()),
            completion: Box::new(completion.clone()),
            interaction: Box::new(ui.clone()),
            interpreter: "bash".to_string(),
            base_dir,
            journal: None,
        };
        Self {
            runtime,
            shell,
            completion,
            ui,
        }
    }

    pub(crate) fn enable_journal(&mut self, path: PathBuf) {
        self.runtime.journal = Some(Journal::new(path, Path::new("test-script")));
    }
}
