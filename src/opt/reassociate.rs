//! Canonical operand order for commutative operations
//!
//! Operands are ranked (constants lowest, then incoming arguments, then
//! values by the reverse-postorder position of their defining block) and
//! the higher-ranked operand goes to the left. `a*b` and `b*a` end up with
//! the same shape so value numbering can merge them. Operations are never
//! regrouped: float addition and multiplication are not associative.

use rustc_hash::FxHashMap;

use crate::lir::{Cfg, LirFunction, LirInstr, Reg};

use super::FunctionPass;

pub struct Reassociate;

impl FunctionPass for Reassociate {
    fn name(&self) -> &'static str {
        "reassociate"
    }

    fn run(&mut self, func: &mut LirFunction) -> bool {
        let cfg = Cfg::compute(func);
        let ranks = compute_ranks(func, &cfg);
        let key = |r: Reg| (ranks.get(&r).copied().unwrap_or(0), r.0);

        let mut changed = false;
        for block in &mut func.blocks {
            for instr in &mut block.instructions {
                if let LirInstr::BinOp { op, lhs, rhs, .. } = instr {
                    if op.is_commutative() && key(*lhs) < key(*rhs) {
                        std::mem::swap(lhs, rhs);
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}

fn compute_ranks(func: &LirFunction, cfg: &Cfg) -> FxHashMap<Reg, u64> {
    let mut ranks = FxHashMap::default();
    let base = func.arity as u64 + 1;
    for (position, &label) in cfg.rpo.iter().enumerate() {
        let block_rank = base + position as u64 + 1;
        let block = func.block(label);
        for &param in &block.params {
            ranks.insert(param, block_rank);
        }
        for instr in &block.instructions {
            let rank = match instr {
                LirInstr::Const { .. } => 0,
                LirInstr::Param { index, .. } => 1 + *index as u64,
                _ => block_rank,
            };
            if let Some(dst) = instr.dst() {
                ranks.insert(dst, rank);
            }
        }
    }
    ranks
}
