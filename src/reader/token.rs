use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: usize,
    pub col: usize,
}

impl SourceLoc {
    pub fn new(line: usize, col: usize) -> Self {
        SourceLoc { line, col }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLoc {
    pub token: Token,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,
    Def,
    Extern,
    If,
    Then,
    Else,
    For,
    In,
    Identifier(String),
    Number(f64),
    /// Malformed numeric literal, reported by the parser
    BadNumber(String),
    /// Any other single character
    Char(char),
}

impl Token {
    /// Match an identifier against the reserved words
    pub fn keyword_or_ident(word: &str) -> Token {
        match word {
            "def" => Token::Def,
            "extern" => Token::Extern,
            "if" => Token::If,
            "then" => Token::Then,
            "else" => Token::Else,
            "for" => Token::For,
            "in" => Token::In,
            _ => Token::Identifier(word.to_string()),
        }
    }

    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Token::Char(x) if *x == c)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::If => write!(f, "'if'"),
            Token::Then => write!(f, "'then'"),
            Token::Else => write!(f, "'else'"),
            Token::For => write!(f, "'for'"),
            Token::In => write!(f, "'in'"),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Number(n) => write!(f, "number {}", n),
            Token::BadNumber(text) => write!(f, "malformed number '{}'", text),
            Token::Char(c) => write!(f, "'{}'", c),
        }
    }
}
