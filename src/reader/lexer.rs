use super::token::{SourceLoc, Token, TokenWithLoc};
use super::LineSource;
use std::io;

/// Characters that may continue a numeric literal
#[inline]
fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Pull-based tokenizer over an interactive line source.
///
/// Input is requested one line at a time, and only when the current line is
/// exhausted, so the lexer blocks exactly where the interactive loop needs
/// more input: at a unit boundary or inside an unfinished unit.
pub struct Lexer<S> {
    source: S,
    prompt: String,
    line: Vec<char>,
    pos: usize,
    line_no: usize,
    finished: bool,
    error: Option<io::Error>,
    current: Option<TokenWithLoc>,
}

impl<S: LineSource> Lexer<S> {
    pub fn new(source: S) -> Self {
        Lexer {
            source,
            prompt: String::new(),
            line: Vec::new(),
            pos: 0,
            line_no: 0,
            finished: false,
            error: None,
            current: None,
        }
    }

    /// Prompt passed to the source whenever a new line is needed
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Current lookahead token, reading it on first use
    pub fn peek(&mut self) -> &Token {
        let tok = match self.current.take() {
            Some(tok) => tok,
            None => self.lex(),
        };
        &self.current.insert(tok).token
    }

    /// Location of the current lookahead token
    pub fn loc(&mut self) -> SourceLoc {
        let tok = match self.current.take() {
            Some(tok) => tok,
            None => self.lex(),
        };
        self.current.insert(tok).loc
    }

    /// Drop the current lookahead; the next `peek` reads a fresh token
    pub fn advance(&mut self) {
        if self.current.is_none() {
            self.lex();
        }
        self.current = None;
    }

    /// Read error that ended the input early, if any
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn fill_line(&mut self) {
        match self.source.read_line(&self.prompt) {
            Ok(Some(mut text)) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                self.line = text.chars().collect();
                self.pos = 0;
                self.line_no += 1;
            }
            Ok(None) => self.finished = true,
            Err(e) => {
                self.error = Some(e);
                self.finished = true;
            }
        }
    }

    fn current_char(&mut self) -> Option<char> {
        while self.pos >= self.line.len() {
            if self.finished {
                return None;
            }
            self.fill_line();
        }
        Some(self.line[self.pos])
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                // Comment until end of line
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn lex(&mut self) -> TokenWithLoc {
        self.skip_whitespace();
        let loc = SourceLoc::new(self.line_no, self.pos + 1);

        let token = match self.current_char() {
            None => Token::Eof,
            Some(c) if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                while let Some(c) = self.current_char() {
                    if !c.is_ascii_alphanumeric() {
                        break;
                    }
                    word.push(c);
                    self.bump();
                }
                Token::keyword_or_ident(&word)
            }
            Some(c) if is_number_char(c) => {
                let mut text = String::new();
                while let Some(c) = self.current_char() {
                    if !is_number_char(c) {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }
                match text.parse::<f64>() {
                    Ok(n) => Token::Number(n),
                    Err(_) => Token::BadNumber(text),
                }
            }
            Some(c) => {
                self.bump();
                Token::Char(c)
            }
        };

        TokenWithLoc { token, loc }
    }
}
