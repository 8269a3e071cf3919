//! Line sources: where the loop driver gets operator input from.

use crate::command::FatalError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};

/// Blocking supplier of operator input, one line at a time.
pub trait LineSource {
    /// Shows `prompt` and blocks until a full line is available.
    ///
    /// Returns the line with its terminator, `Ok(None)` once input is
    /// exhausted, or a fatal error for any other failure.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, FatalError>;
}

/// Plain buffered reader, used for piped input and in tests.
///
/// Lines are returned as read, so a final line without a newline is returned
/// without one. Bytes that are not valid UTF-8 become U+FFFD.
pub struct StdinSource<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StdinSource<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for StdinSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, FatalError> {
        if let Err(e) = write!(self.prompt_out, "{}", prompt).and_then(|()| self.prompt_out.flush()) {
            log::warn!("could not write prompt: {}", e);
        }

        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = match String::from_utf8(buf) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("input line is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        Ok(Some(line))
    }
}

/// Interactive line editing on a terminal.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> Result<Self, FatalError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, FatalError> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    // Arrow-key recall only.
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        log::debug!("editor history rejected entry: {}", e);
                    }
                    return Ok(Some(line + "\n"));
                }
                Err(ReadlineError::Interrupted) => {
                    log::trace!("line discarded by interrupt");
                }
                Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                    log::warn!("line discarded, not valid UTF-8: {}", e);
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }
}
