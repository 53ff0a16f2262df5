//! Terminal-backed user interaction.

use super::{Choice, Interaction};
use crate::error::{Result, SiestaError};
use std::io::{BufRead, Write};
use std::process::Command;

/// Interaction through the controlling terminal and the user's editor.
#[derive(Debug, Clone)]
pub struct TerminalInteraction {
    editor: String,
}

impl TerminalInteraction {
    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
        }
    }
}

/// Pick the editor command: config, then `$VISUAL`, then `$EDITOR`, then `vi`.
pub fn resolve_editor(
    configured: Option<&str>,
    visual: Option<String>,
    editor: Option<String>,
) -> String {
    configured
        .map(str::to_string)
        .into_iter()
        .chain(visual)
        .chain(editor)
        .find(|candidate| !candidate.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Map an answer to the `askrun` question onto a choice.
fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "x" => Some(Choice::Execute),
        "d" | "e" => Some(Choice::Edit),
        "q" => Some(Choice::Quit),
        _ => None,
    }
}

/// Ask until a valid answer arrives. End of input counts as quitting.
fn read_choice<R: BufRead, W: Write>(command: &str, input: &mut R, output: &mut W) -> Result<Choice> {
    let io_err = |e: std::io::Error| SiestaError::Io(format!("failed to prompt for confirmation: {}", e));

    writeln!(output, "$ {}", command).map_err(io_err)?;
    loop {
        write!(output, "E[x]ecute, E[d]it or [Q]uit? ").map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut answer = String::new();
        if input.read_line(&mut answer).map_err(io_err)? == 0 {
            writeln!(output).map_err(io_err)?;
            return Ok(Choice::Quit);
        }
        if let Some(choice) = parse_choice(&answer) {
            return Ok(choice);
        }
    }
}

impl Interaction for TerminalInteraction {
    fn edit(&mut self, seed: &str) -> Result<Option<String>> {
        let mut file = tempfile::Builder::new()
            .prefix("siesta-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| SiestaError::Io(format!("failed to create edit buffer: {}", e)))?;
        file.write_all(seed.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| SiestaError::Io(format!("failed to write edit buffer: {}", e)))?;

        let args = shell_words::split(&self.editor).map_err(|e| {
            SiestaError::Config(format!("failed to parse editor '{}': {}", self.editor, e))
        })?;
        let Some((program, program_args)) = args.split_first() else {
            return Err(SiestaError::Config("editor command is empty".to_string()));
        };

        let status = Command::new(program)
            .args(program_args)
            .arg(file.path())
            .status()
            .map_err(|e| {
                SiestaError::Io(format!(
                    "failed to launch editor '{}': {}\nFix: set $EDITOR or `editor` in config.yaml.",
                    program, e
                ))
            })?;

        if !status.success() {
            tracing::debug!(code = ?status.code(), "editor exited unsuccessfully, treating as cancel");
            return Ok(None);
        }

        let mut edited = std::fs::read_to_string(file.path())
            .map_err(|e| SiestaError::Io(format!("failed to read edit buffer: {}", e)))?;
        if edited.ends_with('\n') && !seed.ends_with('\n') {
            edited.pop();
        }
        Ok(Some(edited))
    }

    fn confirm(&mut self, command: &str) -> Result<Choice> {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stderr();
        read_choice(command, &mut input, &mut output)
    }

    fn show(&mut self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{}", text)
            .and_then(|_| stdout.flush())
            .map_err(|e| SiestaError::Io(format!("failed to write to stdout: {}", e)))
    }
}
