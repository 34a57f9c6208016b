//! Precedence-climbing parser for top-level units

use rustc_hash::FxHashMap;

use super::lexer::Lexer;
use super::token::Token;
use super::LineSource;
use crate::ast::{Expr, Function, Prototype};
use crate::error::SyntaxError;

/// Binary operator precedence; higher binds tighter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceTable {
    ops: FxHashMap<char, i32>,
}

impl PrecedenceTable {
    pub fn empty() -> Self {
        PrecedenceTable {
            ops: FxHashMap::default(),
        }
    }

    /// Install (or replace) an operator. 1 is the lowest precedence.
    pub fn with(mut self, op: char, precedence: i32) -> Self {
        self.ops.insert(op, precedence);
        self
    }

    pub fn get(&self, op: char) -> Option<i32> {
        self.ops.get(&op).copied().filter(|p| *p > 0)
    }
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        PrecedenceTable::empty()
            .with('<', 10)
            .with('+', 20)
            .with('-', 20)
            .with('*', 40)
    }
}

type ParseResult<T> = Result<T, SyntaxError>;

/// Deepest expression tree the parser will build. Every later stage walks
/// the tree recursively, so this bounds their stack use too.
pub const MAX_NESTING: usize = 256;

pub struct Parser<S> {
    lexer: Lexer<S>,
    precedence: PrecedenceTable,
    depth: usize,
}

impl<S: LineSource> Parser<S> {
    pub fn new(lexer: Lexer<S>, precedence: PrecedenceTable) -> Self {
        Parser {
            lexer,
            precedence,
            depth: 0,
        }
    }

    /// Current lookahead token
    pub fn peek(&mut self) -> &Token {
        self.lexer.peek()
    }

    /// Consume the current lookahead token
    pub fn advance(&mut self) {
        self.lexer.advance();
    }

    /// Read error that ended the input early, if any
    pub fn take_io_error(&mut self) -> Option<std::io::Error> {
        self.lexer.take_error()
    }

    /// definition ::= 'def' prototype expression
    pub fn parse_definition(&mut self) -> ParseResult<Function> {
        self.expect(Token::Def)?;
        let proto = self.parse_prototype()?;
        let body = self.parse_expression()?;
        Ok(Function::new(proto, body))
    }

    /// external ::= 'extern' prototype
    pub fn parse_extern(&mut self) -> ParseResult<Prototype> {
        self.expect(Token::Extern)?;
        self.parse_prototype()
    }

    /// A bare expression, wrapped into an anonymous zero-argument function
    pub fn parse_top_level_expr(&mut self) -> ParseResult<Function> {
        let body = self.parse_expression()?;
        Ok(Function::new(Prototype::anonymous(), body))
    }

    fn error<T>(&mut self, message: impl Into<String>) -> ParseResult<T> {
        let loc = self.lexer.loc();
        Err(SyntaxError::new(message, loc))
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            let found = self.peek().to_string();
            self.error(format!("expected {}, found {}", expected, found))
        }
    }

    fn expect_char(&mut self, c: char) -> ParseResult<()> {
        self.expect(Token::Char(c))
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<String> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => self.error(format!("expected {}, found {}", what, other)),
        }
    }

    /// prototype ::= ident '(' ident* ')'
    fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        let name = self.expect_identifier("function name in prototype")?;
        self.expect_char('(')?;

        let mut params = Vec::new();
        while let Token::Identifier(param) = self.peek().clone() {
            params.push(param);
            self.advance();
        }

        if !self.peek().is_char(')') {
            let found = self.peek().to_string();
            return self.error(format!("expected ')' in prototype, found {}", found));
        }
        self.advance();

        Ok(Prototype::new(name, params))
    }

    /// expression ::= primary binoprhs
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let saved = self.depth;
        let result = self.parse_nested_expression();
        self.depth = saved;
        result
    }

    fn parse_nested_expression(&mut self) -> ParseResult<Expr> {
        self.nest()?;
        let lhs = self.parse_primary()?;
        self.parse_binop_rhs(0, lhs)
    }

    /// One level deeper in the tree under construction
    fn nest(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return self.error(format!(
                "expression nested more than {} levels deep",
                MAX_NESTING
            ));
        }
        Ok(())
    }

    /// Operator and precedence of the lookahead, if it is a known binary operator
    fn current_binop(&mut self) -> Option<(char, i32)> {
        match self.peek() {
            Token::Char(c) => {
                let c = *c;
                self.precedence.get(c).map(|p| (c, p))
            }
            _ => None,
        }
    }

    /// binoprhs ::= (binop primary)*
    fn parse_binop_rhs(&mut self, min_precedence: i32, mut lhs: Expr) -> ParseResult<Expr> {
        loop {
            let (op, precedence) = match self.current_binop() {
                Some((op, p)) if p >= min_precedence => (op, p),
                _ => return Ok(lhs),
            };
            self.advance();
            // Each operator adds a level above `lhs`
            self.nest()?;

            let mut rhs = self.parse_primary()?;

            // If the next operator binds tighter, let it take `rhs` first
            if let Some((_, next)) = self.current_binop() {
                if precedence < next {
                    rhs = self.parse_binop_rhs(precedence + 1, rhs)?;
                }
            }

            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::BadNumber(text) => self.error(format!("malformed number '{}'", text)),
            Token::Identifier(name) => {
                self.advance();
                self.parse_identifier_expr(name)
            }
            Token::Char('(') => self.parse_paren_expr(),
            Token::If => self.parse_if_expr(),
            Token::For => self.parse_for_expr(),
            other => self.error(format!("unknown token {} when expecting an expression", other)),
        }
    }

    /// parenexpr ::= '(' expression ')'
    fn parse_paren_expr(&mut self) -> ParseResult<Expr> {
        self.expect_char('(')?;
        let expr = self.parse_expression()?;
        self.expect_char(')')?;
        Ok(expr)
    }

    /// identifierexpr ::= ident | ident '(' (expression (',' expression)*)? ')'
    fn parse_identifier_expr(&mut self, name: String) -> ParseResult<Expr> {
        if !self.peek().is_char('(') {
            return Ok(Expr::Variable(name));
        }
        self.advance();

        let mut args = Vec::new();
        if !self.peek().is_char(')') {
            loop {
                args.push(self.parse_expression()?);
                if self.peek().is_char(')') {
                    break;
                }
                if !self.peek().is_char(',') {
                    let found = self.peek().to_string();
                    return self.error(format!(
                        "expected ')' or ',' in argument list, found {}",
                        found
                    ));
                }
                self.advance();
            }
        }
        self.advance();

        Ok(Expr::Call { callee: name, args })
    }

    /// ifexpr ::= 'if' expression 'then' expression 'else' expression
    fn parse_if_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::If)?;
        let cond = self.parse_expression()?;
        self.expect(Token::Then)?;
        let then = self.parse_expression()?;
        self.expect(Token::Else)?;
        let else_ = self.parse_expression()?;
        Ok(Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            else_: Box::new(else_),
        })
    }

    /// forexpr ::= 'for' ident '=' expr ',' expr (',' expr)? 'in' expression
    fn parse_for_expr(&mut self) -> ParseResult<Expr> {
        self.expect(Token::For)?;
        let var = self.expect_identifier("identifier after 'for'")?;
        self.expect_char('=')?;
        let start = self.parse_expression()?;
        self.expect_char(',')?;
        let end = self.parse_expression()?;

        let step = if self.peek().is_char(',') {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect(Token::In)?;
        let body = self.parse_expression()?;

        Ok(Expr::For {
            var,
            start: Box::new(start),
            end: Box::new(end),
            step,
            body: Box::new(body),
        })
    }
}
