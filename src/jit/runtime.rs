//! Host functions callable from compiled code
//!
//! These are what an `extern` links to when no definition of the same name
//! and arity exists. All of them use the C calling convention and take and
//! return `f64`.

use std::io::Write;

// =============================================================================
// Math
// =============================================================================

pub extern "C" fn kaleido_sin(x: f64) -> f64 {
    x.sin()
}

pub extern "C" fn kaleido_cos(x: f64) -> f64 {
    x.cos()
}

pub extern "C" fn kaleido_tan(x: f64) -> f64 {
    x.tan()
}

pub extern "C" fn kaleido_sqrt(x: f64) -> f64 {
    x.sqrt()
}

pub extern "C" fn kaleido_exp(x: f64) -> f64 {
    x.exp()
}

/// Natural logarithm
pub extern "C" fn kaleido_log(x: f64) -> f64 {
    x.ln()
}

pub extern "C" fn kaleido_fabs(x: f64) -> f64 {
    x.abs()
}

pub extern "C" fn kaleido_pow(x: f64, y: f64) -> f64 {
    x.powf(y)
}

// =============================================================================
// Output
// =============================================================================

/// Write the character with code `x` to stderr; returns 0
pub extern "C" fn kaleido_putchard(x: f64) -> f64 {
    let byte = x as u8;
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(&[byte]);
    let _ = stderr.flush();
    0.0
}

/// Write `x` and a newline to stderr; returns 0
pub extern "C" fn kaleido_printd(x: f64) -> f64 {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{:.6}", x);
    0.0
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Clone, Copy)]
pub(crate) enum HostFn {
    Unary(extern "C" fn(f64) -> f64),
    Binary(extern "C" fn(f64, f64) -> f64),
}

impl HostFn {
    pub(crate) fn arity(self) -> usize {
        match self {
            HostFn::Unary(_) => 1,
            HostFn::Binary(_) => 2,
        }
    }

    pub(crate) fn as_ptr(self) -> *const u8 {
        match self {
            HostFn::Unary(f) => f as *const u8,
            HostFn::Binary(f) => f as *const u8,
        }
    }
}

/// Source-level name and implementation of every host function
pub(crate) const HOST_FUNCTIONS: &[(&str, HostFn)] = &[
    ("sin", HostFn::Unary(kaleido_sin)),
    ("cos", HostFn::Unary(kaleido_cos)),
    ("tan", HostFn::Unary(kaleido_tan)),
    ("sqrt", HostFn::Unary(kaleido_sqrt)),
    ("exp", HostFn::Unary(kaleido_exp)),
    ("log", HostFn::Unary(kaleido_log)),
    ("fabs", HostFn::Unary(kaleido_fabs)),
    ("pow", HostFn::Binary(kaleido_pow)),
    ("putchard", HostFn::Unary(kaleido_putchard)),
    ("printd", HostFn::Unary(kaleido_printd)),
];

/// Host function named `name` taking exactly `arity` arguments
pub(crate) fn lookup_host(name: &str, arity: usize) -> Option<(&'static str, HostFn)> {
    HOST_FUNCTIONS
        .iter()
        .find(|(host, f)| *host == name && f.arity() == arity)
        .copied()
}

/// Symbol a host function is registered under inside the module
pub(crate) fn host_symbol(name: &str) -> String {
    format!("kaleido_host_{}", name)
}

/// Names an `extern` can link to without a definition
pub fn host_function_names() -> Vec<&'static str> {
    HOST_FUNCTIONS.iter().map(|(name, _)| *name).collect()
}
