//! Local algebraic simplification
//!
//! Folds operations on constants, drops exact identities (`x * 1`, `x - 0`,
//! `x + -0`), moves constants to the right-hand side of commutative
//! operations and removes pure instructions whose result is never used.
//! `x + 0` and `x * 0` are left alone: neither is an identity for `-0.0`
//! and NaN.

use rustc_hash::FxHashMap;

use crate::lir::{BinOp, Cfg, LirFunction, LirInstr, Reg};

use super::{FunctionPass, Substitution};

pub struct InstCombine;

impl FunctionPass for InstCombine {
    fn name(&self) -> &'static str {
        "instcombine"
    }

    fn run(&mut self, func: &mut LirFunction) -> bool {
        let folded = fold(func);
        let removed = remove_dead(func);
        folded || removed
    }
}

fn fold(func: &mut LirFunction) -> bool {
    let cfg = Cfg::compute(func);
    let mut consts: FxHashMap<Reg, f64> = FxHashMap::default();
    let mut subst = Substitution::default();
    let mut changed = false;

    // Reverse postorder sees every definition before its dominated uses
    for &label in &cfg.rpo {
        let block = func.block_mut(label);
        for instr in &mut block.instructions {
            instr.map_uses(|r| subst.resolve(r));
            match instr {
                LirInstr::Const { dst, value } => {
                    consts.insert(*dst, *value);
                }
                LirInstr::BinOp { dst, op, lhs, rhs } => {
                    let (l, r) = (consts.get(lhs).copied(), consts.get(rhs).copied());
                    if let (Some(l), Some(r)) = (l, r) {
                        let value = op.apply(l, r);
                        consts.insert(*dst, value);
                        *instr = LirInstr::Const { dst: *dst, value };
                        changed = true;
                        continue;
                    }
                    if op.is_commutative() && l.is_some() {
                        std::mem::swap(lhs, rhs);
                        changed = true;
                    }
                    if let Some(r) = consts.get(rhs).copied() {
                        if is_right_identity(*op, r) {
                            subst.insert(*dst, *lhs);
                            changed = true;
                        }
                    }
                }
                LirInstr::Cmp { dst, op, lhs, rhs } => {
                    if let (Some(&l), Some(&r)) = (consts.get(lhs), consts.get(rhs)) {
                        let value = op.apply(l, r);
                        consts.insert(*dst, value);
                        *instr = LirInstr::Const { dst: *dst, value };
                        changed = true;
                    }
                }
                LirInstr::Param { .. }
                | LirInstr::Load { .. }
                | LirInstr::Store { .. }
                | LirInstr::Call { .. } => {}
            }
        }
    }

    subst.apply(func);
    changed
}

/// `x op c == x` for every `x`, including `-0.0` and NaN
fn is_right_identity(op: BinOp, c: f64) -> bool {
    match op {
        BinOp::Mul => c == 1.0,
        BinOp::Sub => c == 0.0 && c.is_sign_positive(),
        BinOp::Add => c == 0.0 && c.is_sign_negative(),
    }
}

/// Remove pure instructions with no remaining uses, to a fixpoint
fn remove_dead(func: &mut LirFunction) -> bool {
    let mut changed = false;
    loop {
        let mut uses: FxHashMap<Reg, usize> = FxHashMap::default();
        for block in &func.blocks {
            for instr in &block.instructions {
                for r in instr.uses() {
                    *uses.entry(r).or_default() += 1;
                }
            }
            for r in block.terminator.uses() {
                *uses.entry(r).or_default() += 1;
            }
        }

        let mut removed = false;
        for block in &mut func.blocks {
            let before = block.instructions.len();
            block.instructions.retain(|instr| {
                !(instr.is_pure() && instr.dst().is_some_and(|d| !uses.contains_key(&d)))
            });
            removed |= block.instructions.len() != before;
        }
        if !removed {
            return changed;
        }
        changed = true;
    }
}
