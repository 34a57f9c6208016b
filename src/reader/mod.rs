mod lexer;
mod parser;
mod token;

// Re-export public API
pub use lexer::Lexer;
pub use parser::{Parser, PrecedenceTable};
pub use token::{SourceLoc, Token, TokenWithLoc};

use std::io::{self, BufRead};

/// Interactive stream of source lines
pub trait LineSource {
    /// Read the next line, showing `prompt` if the source is interactive.
    /// Returns `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Non-interactive line source over any buffered reader (pipes, files, tests)
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        (**self).read_line(prompt)
    }
}
