//! Subprocess execution for `run` and `askrun`.
//!
//! The interpreter is spawned directly (no outer shell), the command source is
//! written to its stdin, and stdout/stderr are captured.

use super::{ExecOutput, ExecRequest, Shell};
use crate::error::{Result, SiestaError};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Runs interpreters as child processes of siesta.
#[derive(Debug, Clone)]
pub struct SystemShell {
    /// Working directory for spawned commands.
    pub cwd: PathBuf,
    /// Echo captured stderr of successful commands to our stderr.
    pub echo_stderr: bool,
}

impl SystemShell {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            echo_stderr: true,
        }
    }
}

impl Shell for SystemShell {
    fn exec(&mut self, request: &ExecRequest) -> Result<ExecOutput> {
        let args = shell_words::split(&request.interpreter).map_err(|e| {
            SiestaError::Config(format!(
                "failed to parse interpreter '{}': {}\n\
                 Fix: check for unmatched quotes in the `cmd` argument or the `shell` setting.",
                request.interpreter, e
            ))
        })?;

        let Some((program, program_args)) = args.split_first() else {
            return Err(SiestaError::Config(
                "interpreter is empty after parsing".to_string(),
            ));
        };

        let started = Instant::now();
        let mut child = Command::new(program)
            .args(program_args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SiestaError::Command {
                command: request.source.clone(),
                exit_code: None,
                stderr: format!(
                    "failed to start '{}': {}\nFix: ensure the interpreter is installed and in PATH.",
                    program, e
                ),
            })?;

        // Feed stdin from a separate thread so a chatty child cannot fill its
        // stdout pipe while we are still blocked writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let source = request.source.clone();
            std::thread::spawn(move || {
                let _ = stdin.write_all(source.as_bytes());
            })
        });

        let output = child.wait_with_output().map_err(|e| SiestaError::Command {
            command: request.source.clone(),
            exit_code: None,
            stderr: format!("failed to wait for '{}': {}", program, e),
        })?;

        if let Some(handle) = writer {
            let _ = handle.join();
        }

        let result = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        tracing::debug!(
            interpreter = %request.interpreter,
            exit_code = ?result.exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );

        if self.echo_stderr && result.success() && !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }

        Ok(result)
    }
}
