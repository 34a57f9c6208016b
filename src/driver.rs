//! The interactive driver
//!
//! `Session` owns every piece of state that persists across top-level units:
//! the program image, the symbol table, the optimization pipeline and the
//! JIT backend. It consumes parse events one at a time; `run_toplevel` is
//! the loop that pulls units out of a parser and feeds them in.

use std::fmt::Write as _;
use std::io::Write;

use tracing::{debug, info_span, trace};

use crate::ast::{Function, Prototype, Unit, UnitKind};
use crate::config::SessionConfig;
use crate::error::{Error, SessionError};
use crate::image::{EntryKind, FuncRef, ImageEntry, ProgramImage};
use crate::jit::{EntryPoint, JitBackend, JitError};
use crate::lir::{lower_function, lower_prototype, LirFunction};
use crate::opt::PassManager;
use crate::reader::{LineSource, Parser, Token};
use crate::symbol::{Binding, SymbolTable};

/// Notification from the parse source about one top-level unit
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    /// A unit of this kind has started; carries no obligations
    Enter(UnitKind),
    /// A unit parsed completely
    Exit(Unit),
}

/// Observable result of a handled unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Defined(FuncRef),
    Declared(FuncRef),
    Evaluated(f64),
}

pub struct Session {
    config: SessionConfig,
    image: ProgramImage,
    symbols: SymbolTable,
    passes: PassManager,
    jit: JitBackend,
    anon_counter: u32,
    ir_dump: String,
}

impl Session {
    /// Start a session. Fails only if the native target cannot be set up.
    pub fn new(config: SessionConfig) -> Result<Self, JitError> {
        let jit = JitBackend::new()?;
        let passes = if config.optimize {
            PassManager::standard()
        } else {
            PassManager::new()
        };
        debug!(passes = ?passes.pass_names(), "session started");
        Ok(Session {
            config,
            image: ProgramImage::new(),
            symbols: SymbolTable::new(),
            passes,
            jit,
            anon_counter: 0,
            ir_dump: String::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn image(&self) -> &ProgramImage {
        &self.image
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn backend(&self) -> &JitBackend {
        &self.jit
    }

    /// Dispatch one parse event. `Enter` has no effect beyond a trace.
    pub fn on_event(&mut self, event: ParseEvent) -> Result<Option<Outcome>, SessionError> {
        match event {
            ParseEvent::Enter(kind) => {
                trace!(%kind, "unit started");
                Ok(None)
            }
            ParseEvent::Exit(unit) => {
                let _span = info_span!("unit", kind = %unit.kind()).entered();
                let outcome = match unit {
                    Unit::Definition(function) => {
                        Outcome::Defined(self.handle_definition(&function)?)
                    }
                    Unit::Extern(proto) => Outcome::Declared(self.handle_extern(&proto)?),
                    Unit::TopLevelExpression(function) => {
                        Outcome::Evaluated(self.handle_top_level_expression(&function)?)
                    }
                };
                Ok(Some(outcome))
            }
        }
    }

    /// Lower, optimize and commit a `def`. Nothing is committed on failure.
    pub fn handle_definition(&mut self, function: &Function) -> Result<FuncRef, SessionError> {
        let name = function.proto.name.as_str();
        let func = self.image.next_ref();
        let body = lower_function(
            function,
            name,
            func,
            EntryKind::Definition,
            &self.symbols,
        )?;
        let body = self.optimize(body);

        let symbol = self.image.symbol_for(name, EntryKind::Definition);
        let arity = function.proto.arity();
        let func = self.image.push(ImageEntry {
            name: name.to_string(),
            symbol,
            arity,
            kind: EntryKind::Definition,
            body: Some(body),
        });
        self.symbols.bind(
            name,
            Binding {
                func,
                arity,
                kind: EntryKind::Definition,
            },
        );
        debug!(%func, name, arity, "defined");
        Ok(func)
    }

    /// Commit a bodiless `extern` declaration
    pub fn handle_extern(&mut self, proto: &Prototype) -> Result<FuncRef, SessionError> {
        let decl = lower_prototype(proto, &self.symbols)?;
        let symbol = self.image.symbol_for(&decl.name, EntryKind::Extern);
        let func = self.image.push(ImageEntry {
            name: decl.name.clone(),
            symbol,
            arity: decl.arity,
            kind: EntryKind::Extern,
            body: None,
        });
        self.symbols.bind(
            decl.name.as_str(),
            Binding {
                func,
                arity: decl.arity,
                kind: EntryKind::Extern,
            },
        );
        debug!(%func, name = %decl.name, arity = decl.arity, "declared");
        Ok(func)
    }

    /// Lower a bare expression into a fresh wrapper, compile it and run it.
    ///
    /// The wrapper stays in the image but is never bound to a name.
    pub fn handle_top_level_expression(&mut self, function: &Function) -> Result<f64, SessionError> {
        let name = format!("__anon_expr{}", self.anon_counter);
        let func = self.image.next_ref();
        let body = lower_function(
            function,
            &name,
            func,
            EntryKind::Anonymous,
            &self.symbols,
        )?;
        self.anon_counter += 1;
        let body = self.optimize(body);

        let symbol = self.image.symbol_for(&name, EntryKind::Anonymous);
        let func = self.image.push(ImageEntry {
            name,
            symbol,
            arity: 0,
            kind: EntryKind::Anonymous,
            body: Some(body),
        });

        let entry = self.resolve(func)?;
        let value = self.invoke(entry)?;
        debug!(%func, value, "evaluated");
        Ok(value)
    }

    /// Compile `func` if needed and return its entry point
    pub fn resolve(&mut self, func: FuncRef) -> Result<EntryPoint, JitError> {
        self.jit.resolve(&self.image, func)
    }

    pub fn invoke(&self, entry: EntryPoint) -> Result<f64, JitError> {
        self.jit.invoke(entry)
    }

    /// IR text queued by `dump_ir` since the last call
    pub fn take_ir_dump(&mut self) -> Option<String> {
        if self.ir_dump.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.ir_dump))
        }
    }

    fn optimize(&mut self, mut body: LirFunction) -> LirFunction {
        if self.config.dump_ir {
            let _ = write!(self.ir_dump, "; lowered\n{}", body);
        }
        if self.config.optimize {
            self.passes.run(&mut body);
            if self.config.dump_ir {
                let _ = write!(self.ir_dump, "; optimized\n{}", body);
            }
        }
        body
    }
}

/// Counters for one run of the top-level loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Units that parsed and were handled successfully
    pub units: usize,
    /// Syntax and session errors reported
    pub errors: usize,
    /// Bare expressions evaluated
    pub evaluations: usize,
}

/// Drive `session` from `parser` until end of input.
///
/// Results go to `out` as `Evaluated to <value>`, diagnostics to `diag` as
/// `error: <message>`. Only I/O failures end the loop early.
pub fn run_toplevel<S, O, D>(
    parser: &mut Parser<S>,
    session: &mut Session,
    out: &mut O,
    diag: &mut D,
) -> Result<LoopSummary, Error>
where
    S: LineSource,
    O: Write,
    D: Write,
{
    let mut summary = LoopSummary::default();

    loop {
        let kind = match parser.peek() {
            Token::Eof => break,
            Token::Char(';') => None,
            Token::Def => Some(UnitKind::Definition),
            Token::Extern => Some(UnitKind::Extern),
            _ => Some(UnitKind::TopLevelExpression),
        };
        let Some(kind) = kind else {
            parser.advance();
            continue;
        };

        session.on_event(ParseEvent::Enter(kind)).map_err(Error::Session)?;
        let parsed = match kind {
            UnitKind::Definition => parser.parse_definition().map(Unit::Definition),
            UnitKind::Extern => parser.parse_extern().map(Unit::Extern),
            UnitKind::TopLevelExpression => {
                parser.parse_top_level_expr().map(Unit::TopLevelExpression)
            }
        };

        let unit = match parsed {
            Ok(unit) => unit,
            Err(e) => {
                writeln!(diag, "error: {}", e)?;
                summary.errors += 1;
                // Skip the offending token and resynchronize
                parser.advance();
                continue;
            }
        };

        let result = session.on_event(ParseEvent::Exit(unit));
        if let Some(dump) = session.take_ir_dump() {
            write!(diag, "{}", dump)?;
        }
        match result {
            Ok(Some(Outcome::Evaluated(value))) => {
                writeln!(out, "Evaluated to {}", value)?;
                out.flush()?;
                summary.units += 1;
                summary.evaluations += 1;
            }
            Ok(_) => summary.units += 1,
            Err(e) => {
                writeln!(diag, "error: {}", e)?;
                summary.errors += 1;
            }
        }
    }

    if let Some(e) = parser.take_io_error() {
        return Err(Error::Io(e));
    }
    debug!(?summary, "end of input");
    Ok(summary)
}
