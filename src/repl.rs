//! Readline-backed line source for interactive sessions
//!
//! Provides the terminal front end of the driver with:
//! - Command history (persisted to disk unless disabled)
//! - Line editing
//!
//! Pipes and files go through `reader::ReaderSource` instead, which never
//! shows a prompt.

use std::io;
use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};

use crate::reader::LineSource;

const HISTORY_FILE: &str = ".kaleido_history";

/// Terminal line source with readline support
pub struct Repl {
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl Repl {
    /// Create an editor, loading history from disk
    pub fn new() -> RustylineResult<Self> {
        Self::with_history(Some(Self::history_file_path()))
    }

    /// Create an editor that neither loads nor saves history
    pub fn without_history() -> RustylineResult<Self> {
        Self::with_history(None)
    }

    fn with_history(history: Option<PathBuf>) -> RustylineResult<Self> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &history {
            // A missing file just means a fresh history
            let _ = editor.load_history(path);
        }
        Ok(Self { editor, history })
    }

    /// Get the path to the history file
    fn history_file_path() -> PathBuf {
        if let Some(home) = dirs_home() {
            home.join(HISTORY_FILE)
        } else {
            PathBuf::from(HISTORY_FILE)
        }
    }

    /// Save history to disk
    pub fn finalize(&mut self) {
        if let Some(path) = &self.history {
            if let Err(e) = self.editor.save_history(path) {
                tracing::debug!(path = %path.display(), error = %e, "could not save history");
            }
        }
    }
}

/// What one readline call means for the session
#[derive(Debug, PartialEq, Eq)]
enum Read {
    Line(String),
    /// Ctrl-C: drop the partial line and prompt again
    Discard,
    /// Ctrl-D
    End,
}

fn interpret(result: RustylineResult<String>) -> io::Result<Read> {
    match result {
        Ok(line) => Ok(Read::Line(line)),
        Err(ReadlineError::Interrupted) => Ok(Read::Discard),
        Err(ReadlineError::Eof) => Ok(Read::End),
        Err(ReadlineError::Io(e)) => Err(e),
        Err(e) => Err(io::Error::other(e.to_string())),
    }
}

impl LineSource for Repl {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            match interpret(self.editor.readline(prompt))? {
                Read::Line(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    return Ok(Some(line));
                }
                Read::Discard => continue,
                Read::End => return Ok(None),
            }
        }
    }
}

impl Drop for Repl {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// Get home directory path (cross-platform)
fn dirs_home() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}
