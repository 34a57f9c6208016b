//! Low-level Intermediate Representation (LIR)
//!
//! LIR is SSA form with basic blocks, block parameters and virtual
//! registers. Every value is an `f64`.
//!
//! Pipeline:
//! ```text
//! AST → Lower → LIR → Optimize → Cranelift
//! ```

pub mod cfg;
mod display;
mod lower;
mod types;

pub use cfg::Cfg;
pub use lower::{lower_function, lower_prototype, Declaration};
pub use types::{
    is_truthy, BasicBlock, BinOp, BlockCall, CmpOp, Label, LirFunction, LirInstr, Reg, Slot,
    SlotHint, Terminator,
};
