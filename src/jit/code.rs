//! Handles to compiled code

use crate::image::FuncRef;

/// A compiled, zero-argument function that can be invoked.
///
/// Only the backend that produced an entry point can run it; the native
/// pointer itself stays inside the backend, next to the module that owns
/// the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    func: FuncRef,
}

impl EntryPoint {
    pub(crate) fn new(func: FuncRef) -> Self {
        EntryPoint { func }
    }

    /// Image identity this entry point runs
    pub fn func(&self) -> FuncRef {
        self.func
    }
}

/// Native function pointer plus what is needed to call it safely
#[derive(Debug, Clone, Copy)]
pub(crate) struct CompiledCode {
    pub(crate) ptr: *const u8,
    pub(crate) arity: usize,
}

impl CompiledCode {
    /// Call a compiled zero-argument function
    ///
    /// # Safety
    /// `ptr` must point to finalized code with the signature `() -> f64`,
    /// owned by a module that is still alive.
    #[inline]
    pub(crate) unsafe fn call0(&self) -> f64 {
        let f: extern "C" fn() -> f64 = std::mem::transmute(self.ptr);
        f()
    }
}
