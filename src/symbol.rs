//! Name bindings that persist across top-level units

use rustc_hash::FxHashMap;

use crate::image::{EntryKind, FuncRef};

/// What a name currently refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub func: FuncRef,
    pub arity: usize,
    pub kind: EntryKind,
}

/// Persistent symbol table: the most recent definition or declaration of
/// each name, as seen by lowering
#[derive(Debug, Default)]
pub struct SymbolTable {
    bindings: FxHashMap<String, Binding>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            bindings: FxHashMap::default(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Bind `name`, shadowing any previous binding
    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
