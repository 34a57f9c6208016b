//! Native code generation with Cranelift
//!
//! One `JITModule` lives for the whole session. Functions are compiled the
//! first time something reachable from an evaluated expression needs them,
//! then stay in the module for good.
//!
//! ## Architecture
//!
//! ```text
//! ProgramImage + FuncRef -> JitBackend::resolve -> Cranelift IR -> native code -> EntryPoint
//! ```
//!
//! ## Calling Convention
//!
//! Every compiled function uses the host C convention with `f64` arguments
//! and one `f64` result:
//!
//! ```ignore
//! type EntryFn = extern "C" fn(f64, f64, ...) -> f64;
//! ```
//!
//! Entry points handed to `invoke` always take no arguments.

mod code;
mod compiler;
mod runtime;
mod translate;

pub use code::EntryPoint;
pub use compiler::JitBackend;
pub use runtime::host_function_names;

use thiserror::Error;

/// Code generation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JitError {
    /// Host ISA detection or flag setup failed; fatal for the session
    #[error("target initialization failed: {0}")]
    Target(String),

    /// Cranelift rejected a declaration or definition
    #[error("code generation failed: {0}")]
    Module(String),

    /// A declaration links to nothing
    #[error("unresolved external symbol '{name}' taking {arity} argument(s)")]
    UnresolvedSymbol { name: String, arity: usize },

    /// Invalid LIR structure or an invalid request
    #[error("invalid LIR: {0}")]
    InvalidLir(String),
}

impl From<cranelift_module::ModuleError> for JitError {
    fn from(err: cranelift_module::ModuleError) -> Self {
        JitError::Module(err.to_string())
    }
}
