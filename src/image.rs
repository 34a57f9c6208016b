//! The program image: every function lowered during a session
//!
//! Append-only. An entry's `FuncRef` is its identity for the rest of the
//! session; the JIT backend keys compiled code by it and lowered calls
//! refer to callees by it.

use std::fmt;

use crate::lir::LirFunction;

/// Identity of a lowered function inside the program image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncRef(pub u32);

impl FuncRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FuncRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// What produced an image entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `def` with a body
    Definition,
    /// `extern` declaration, linked by name when first resolved
    Extern,
    /// Synthesized wrapper around a bare expression
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct ImageEntry {
    /// Source-level name (the synthesized one for wrappers)
    pub name: String,
    /// Symbol used inside the native module; unique per identity
    pub symbol: String,
    pub arity: usize,
    pub kind: EntryKind,
    /// `None` for bodiless declarations
    pub body: Option<LirFunction>,
}

impl ImageEntry {
    pub fn is_declaration(&self) -> bool {
        self.body.is_none()
    }
}

#[derive(Debug, Default)]
pub struct ProgramImage {
    entries: Vec<ImageEntry>,
}

impl ProgramImage {
    pub fn new() -> Self {
        ProgramImage {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identity the next appended entry will receive
    pub fn next_ref(&self) -> FuncRef {
        FuncRef(self.entries.len() as u32)
    }

    /// Native symbol for a new identity named `name`
    pub fn symbol_for(&self, name: &str, kind: EntryKind) -> String {
        match kind {
            EntryKind::Anonymous => name.to_string(),
            EntryKind::Definition | EntryKind::Extern => {
                format!("{}.{}", name, self.next_ref().0)
            }
        }
    }

    pub fn push(&mut self, entry: ImageEntry) -> FuncRef {
        let func = self.next_ref();
        self.entries.push(entry);
        func
    }

    pub fn get(&self, func: FuncRef) -> Option<&ImageEntry> {
        self.entries.get(func.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (FuncRef, &ImageEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (FuncRef(i as u32), e))
    }
}

impl fmt::Display for ProgramImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (func, entry) in self.iter() {
            match &entry.body {
                Some(body) => writeln!(f, "; {} = {}\n{}", func, entry.symbol, body)?,
                None => writeln!(
                    f,
                    "; {} = {}\ndeclare {}/{}\n",
                    func, entry.symbol, entry.name, entry.arity
                )?,
            }
        }
        Ok(())
    }
}
