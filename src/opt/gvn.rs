//! Dominator-scoped value numbering
//!
//! A pure instruction identical to one in a dominating position is replaced
//! by the earlier result. Calls and memory operations never take part.

use rustc_hash::FxHashMap;

use crate::lir::{BinOp, Cfg, CmpOp, Label, LirFunction, LirInstr, Reg};

use super::{FunctionPass, Substitution};

pub struct Gvn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ValueKey {
    /// Bit pattern, so `0.0` and `-0.0` stay distinct
    Const(u64),
    Param(u16),
    BinOp(BinOp, Reg, Reg),
    Cmp(CmpOp, Reg, Reg),
}

impl ValueKey {
    fn of(instr: &LirInstr) -> Option<Self> {
        match instr {
            LirInstr::Const { value, .. } => Some(ValueKey::Const(value.to_bits())),
            LirInstr::Param { index, .. } => Some(ValueKey::Param(*index)),
            LirInstr::BinOp { op, lhs, rhs, .. } => {
                let (lhs, rhs) = if op.is_commutative() && rhs > lhs {
                    (*rhs, *lhs)
                } else {
                    (*lhs, *rhs)
                };
                Some(ValueKey::BinOp(*op, lhs, rhs))
            }
            LirInstr::Cmp { op, lhs, rhs, .. } => Some(ValueKey::Cmp(*op, *lhs, *rhs)),
            LirInstr::Load { .. } | LirInstr::Store { .. } | LirInstr::Call { .. } => None,
        }
    }
}

impl FunctionPass for Gvn {
    fn name(&self) -> &'static str {
        "gvn"
    }

    fn run(&mut self, func: &mut LirFunction) -> bool {
        let cfg = Cfg::compute(func);
        if cfg.rpo.is_empty() {
            return false;
        }
        let children = cfg.dom_children();
        let mut table: FxHashMap<ValueKey, Reg> = FxHashMap::default();
        let mut subst = Substitution::default();
        let mut changed = false;

        enum Visit {
            Enter(Label),
            Exit(Vec<ValueKey>),
        }
        let mut visits = vec![Visit::Enter(func.entry)];

        while let Some(visit) = visits.pop() {
            let label = match visit {
                Visit::Enter(label) => label,
                Visit::Exit(scope) => {
                    for key in scope {
                        table.remove(&key);
                    }
                    continue;
                }
            };

            let mut scope = Vec::new();
            let block = func.block_mut(label);
            block.instructions.retain_mut(|instr| {
                instr.map_uses(|r| subst.resolve(r));
                let (Some(key), Some(dst)) = (ValueKey::of(instr), instr.dst()) else {
                    return true;
                };
                match table.get(&key) {
                    Some(&existing) => {
                        subst.insert(dst, existing);
                        changed = true;
                        false
                    }
                    None => {
                        table.insert(key, dst);
                        scope.push(key);
                        true
                    }
                }
            });

            visits.push(Visit::Exit(scope));
            for &child in children[label.index()].iter().rev() {
                visits.push(Visit::Enter(child));
            }
        }

        subst.apply(func);
        changed
    }
}
