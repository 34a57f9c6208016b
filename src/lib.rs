//! # Kaleido - an interactive JIT for the Kaleidoscope language
//!
//! Kaleido reads top-level units (function definitions, `extern`
//! declarations and bare expressions) one at a time, lowers each into a
//! small SSA intermediate representation, optimizes it and, for bare
//! expressions, compiles it to native code with Cranelift and runs it.
//!
//! ## Quick Start
//!
//! ```
//! use kaleido::{run_toplevel, Lexer, Parser, ReaderSource, Session, SessionConfig};
//!
//! let source = "def foo(a b) a*a + 2*a*b + b*b;\nfoo(1, 2);\n";
//! let config = SessionConfig::default();
//! let lexer = Lexer::new(ReaderSource::new(source.as_bytes()));
//! let mut parser = Parser::new(lexer, config.precedence.clone());
//! let mut session = Session::new(config).unwrap();
//!
//! let (mut out, mut diag) = (Vec::new(), Vec::new());
//! run_toplevel(&mut parser, &mut session, &mut out, &mut diag).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "Evaluated to 9\n");
//! ```
//!
//! ## Architecture
//!
//! Every unit goes through the same stages:
//!
//! 1. **Reader**: pull-based lexer and precedence-climbing parser
//! 2. **Lowering**: AST to LIR against the persistent symbol table
//! 3. **Optimization**: a fixed pipeline of function-local passes
//! 4. **JIT**: Cranelift compilation of a function and its callees, on demand
//!
//! `Session` owns the program image, the symbol table, the pass pipeline and
//! the JIT backend; `run_toplevel` drives it from a parser.

pub mod ast;
pub mod config;
pub mod driver;
pub mod error;
pub mod image;
pub mod jit;
pub mod lir;
pub mod opt;
pub mod reader;
pub mod repl;
pub mod symbol;

pub use ast::{Expr, Function, Prototype, Unit, UnitKind};
pub use config::SessionConfig;
pub use driver::{run_toplevel, LoopSummary, Outcome, ParseEvent, Session};
pub use error::{Error, LowerError, SessionError, SyntaxError};
pub use image::{EntryKind, FuncRef, ImageEntry, ProgramImage};
pub use jit::{host_function_names, EntryPoint, JitBackend, JitError};
pub use lir::LirFunction;
pub use opt::{FunctionPass, PassManager};
pub use reader::{Lexer, LineSource, Parser, PrecedenceTable, ReaderSource};
pub use symbol::{Binding, SymbolTable};
