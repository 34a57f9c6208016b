//! Text form of LIR, used by the `--dump-ir` and `--dump-module` output

use std::fmt;

use super::types::{BasicBlock, BlockCall, LirFunction, LirInstr, Reg, SlotHint, Terminator};

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Display for super::types::Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block{}", self.0)
    }
}

impl fmt::Display for super::types::Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

fn write_regs(f: &mut fmt::Formatter<'_>, regs: &[Reg]) -> fmt::Result {
    for (i, reg) in regs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", reg)?;
    }
    Ok(())
}

impl fmt::Display for BlockCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            write_regs(f, &self.args)?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for LirInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LirInstr::Const { dst, value } => write!(f, "{} = const {:?}", dst, value),
            LirInstr::Param { dst, index } => write!(f, "{} = param {}", dst, index),
            LirInstr::Load { dst, slot } => write!(f, "{} = load {}", dst, slot),
            LirInstr::Store { slot, src } => write!(f, "store {}, {}", slot, src),
            LirInstr::BinOp { dst, op, lhs, rhs } => {
                write!(f, "{} = {} {}, {}", dst, op.mnemonic(), lhs, rhs)
            }
            LirInstr::Cmp { dst, op, lhs, rhs } => {
                write!(f, "{} = {} {}, {}", dst, op.mnemonic(), lhs, rhs)
            }
            LirInstr::Call { dst, callee, args } => {
                write!(f, "{} = call {}(", dst, callee)?;
                write_regs(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Return(reg) => write!(f, "ret {}", reg),
            Terminator::Jump(call) => write!(f, "jump {}", call),
            Terminator::Branch { cond, then_, else_ } => {
                write!(f, "brif {}, {}, {}", cond, then_, else_)
            }
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if !self.params.is_empty() {
            write!(f, "(")?;
            write_regs(f, &self.params)?;
            write!(f, ")")?;
        }
        writeln!(f, ":")?;
        for instr in &self.instructions {
            writeln!(f, "    {}", instr)?;
        }
        writeln!(f, "    {}", self.terminator)
    }
}

impl fmt::Display for LirFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function {}/{} {{", self.name, self.arity)?;
        for (i, hint) in self.slots.iter().enumerate() {
            let hint = match hint {
                SlotHint::Unknown => "unknown",
                SlotHint::Private => "private",
                SlotHint::MayAlias => "may-alias",
            };
            writeln!(f, "  s{}: {}", i, hint)?;
        }
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}
