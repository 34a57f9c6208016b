//! Session configuration
//!
//! Built by the binary from command-line flags; tests construct it directly.

use crate::reader::PrecedenceTable;

/// Knobs for one interactive session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Run the optimization pipeline on every lowered body (default: true)
    pub optimize: bool,
    /// Print each function's IR after lowering and after optimization
    pub dump_ir: bool,
    /// Print the whole program image at clean end of input
    pub dump_module: bool,
    /// Prompt shown by interactive line sources (default: "ready> ")
    pub prompt: String,
    /// Binary operator precedence
    pub precedence: PrecedenceTable,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            optimize: true,
            dump_ir: false,
            dump_module: false,
            prompt: "ready> ".to_string(),
            precedence: PrecedenceTable::default(),
        }
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_dump_ir(mut self, dump_ir: bool) -> Self {
        self.dump_ir = dump_ir;
        self
    }

    pub fn with_dump_module(mut self, dump_module: bool) -> Self {
        self.dump_module = dump_module;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_precedence(mut self, precedence: PrecedenceTable) -> Self {
        self.precedence = precedence;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
