use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use qgrid_core::editor_hint::{cursor_position, CursorHint};
use qgrid_core::grid::EditorOutcome;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor command is empty")]
    EmptyCommand,
    #[error("editor command `{command}` has unbalanced quotes")]
    Unparsable { command: String },
    #[error("failed to prepare temp file: {source}")]
    TempFile {
        #[source]
        source: io::Error,
    },
    #[error("failed to launch editor `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("editor `{program}` exited with {status}")]
    Exit { program: String, status: ExitStatus },
    #[error("failed to read edited file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditorKind {
    Vim,
    Nano,
    Emacs,
    VsCode,
    Other,
}

impl EditorKind {
    fn of(program: &str) -> Self {
        let name = Path::new(program)
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or(program);
        match name {
            "vim" | "nvim" | "vi" => Self::Vim,
            "nano" => Self::Nano,
            "emacs" | "emacsclient" => Self::Emacs,
            "code" | "vscode" | "codium" => Self::VsCode,
            _ => Self::Other,
        }
    }
}

/// An editor command line such as `nvim` or `code --new-window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEditor {
    program: String,
    args: Vec<String>,
}

impl ExternalEditor {
    pub fn from_command(command: &str) -> Result<Self, EditorError> {
        let mut parts = shlex::split(command).ok_or_else(|| EditorError::Unparsable {
            command: command.to_string(),
        })?;
        if parts.is_empty() {
            return Err(EditorError::EmptyCommand);
        }
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
        })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Editor invocation with the cursor placed at 1-based `line`/`column`
    /// for editors that accept it.
    #[must_use]
    pub fn command_for(&self, path: &Path, line: usize, column: usize) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        match EditorKind::of(&self.program) {
            EditorKind::Vim => {
                command.arg(format!("+call cursor({line},{column})")).arg(path);
            }
            EditorKind::Nano => {
                command.arg(format!("+{line},{column}")).arg(path);
            }
            EditorKind::Emacs => {
                command.arg(format!("+{line}:{column}")).arg(path);
            }
            EditorKind::VsCode => {
                command
                    .arg("--goto")
                    .arg(format!("{}:{line}:{column}", path.display()))
                    .arg("--wait");
            }
            EditorKind::Other => {
                command.arg(path);
            }
        }
        command
    }

    /// Writes `content` to a temp file, waits for the editor, and returns the
    /// saved text, or `None` when the editor left the file blank.
    pub fn edit(&self, content: &str, hint: CursorHint) -> Result<Option<String>, EditorError> {
        let mut file = tempfile::Builder::new()
            .prefix("qgrid-")
            .suffix(".sql")
            .tempfile()
            .map_err(|source| EditorError::TempFile { source })?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| EditorError::TempFile { source })?;

        let (line, column) = cursor_position(content, hint);
        let path = file.path().to_path_buf();
        info!(program = %self.program, path = %path.display(), line, column, "launching editor");

        let status = self
            .command_for(&path, line, column)
            .status()
            .map_err(|source| EditorError::Launch {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(EditorError::Exit {
                program: self.program.clone(),
                status,
            });
        }

        let edited = fs::read_to_string(&path).map_err(|source| EditorError::Read {
            path: path.clone(),
            source,
        })?;
        debug!(bytes = edited.len(), "editor closed");
        Ok((!edited.trim().is_empty()).then_some(edited))
    }

    /// [`Self::edit`] folded into the event the grid expects back.
    #[must_use]
    pub fn run(&self, content: &str, hint: CursorHint) -> EditorOutcome {
        match self.edit(content, hint) {
            Ok(Some(edited)) => EditorOutcome::Saved(edited),
            Ok(None) => EditorOutcome::Empty,
            Err(error) => {
                warn!(%error, "editor round trip failed");
                EditorOutcome::Failed(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{EditorError, ExternalEditor};

    fn args_for(command: &str) -> Vec<String> {
        let editor = ExternalEditor::from_command(command).expect("command should parse");
        editor
            .command_for(Path::new("/tmp/q.sql"), 3, 7)
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn cursor_arguments_follow_editor_conventions() {
        assert_eq!(args_for("nvim"), ["+call cursor(3,7)", "/tmp/q.sql"]);
        assert_eq!(args_for("/usr/bin/vim"), ["+call cursor(3,7)", "/tmp/q.sql"]);
        assert_eq!(args_for("nano"), ["+3,7", "/tmp/q.sql"]);
        assert_eq!(args_for("emacs -nw"), ["-nw", "+3:7", "/tmp/q.sql"]);
        assert_eq!(args_for("code"), ["--goto", "/tmp/q.sql:3:7", "--wait"]);
        assert_eq!(args_for("hx"), ["/tmp/q.sql"]);
    }

    #[test]
    fn command_lines_are_split_like_a_shell() {
        let editor = ExternalEditor::from_command("'my editor' --flag").expect("should parse");
        assert_eq!(editor.program(), "my editor");
        assert!(matches!(
            ExternalEditor::from_command("   "),
            Err(EditorError::EmptyCommand)
        ));
        assert!(matches!(
            ExternalEditor::from_command("vim 'unterminated"),
            Err(EditorError::Unparsable { .. })
        ));
    }
}
