//! Control-flow cleanup
//!
//! Folds branches on constants and branches whose arms are identical,
//! forwards trivial block parameters, merges a block into its only
//! predecessor when that predecessor jumps straight to it, then drops
//! unreachable blocks and renumbers the survivors densely.

use rustc_hash::FxHashMap;

use crate::lir::{is_truthy, BlockCall, Cfg, Label, LirFunction, LirInstr, Reg, Terminator};

use super::{prune_trivial_params, FunctionPass};

pub struct SimplifyCfg;

impl FunctionPass for SimplifyCfg {
    fn name(&self) -> &'static str {
        "simplify-cfg"
    }

    fn run(&mut self, func: &mut LirFunction) -> bool {
        let mut changed = false;
        loop {
            let mut round = fold_branches(func);
            round |= prune_trivial_params(func);
            round |= merge_chains(func);
            if !round {
                break;
            }
            changed = true;
        }
        changed | remove_unreachable(func)
    }
}

fn fold_branches(func: &mut LirFunction) -> bool {
    let consts: FxHashMap<Reg, f64> = func
        .blocks
        .iter()
        .flat_map(|b| b.instructions.iter())
        .filter_map(|i| match i {
            LirInstr::Const { dst, value } => Some((*dst, *value)),
            _ => None,
        })
        .collect();

    let mut changed = false;
    for block in &mut func.blocks {
        let Terminator::Branch { cond, then_, else_ } = &block.terminator else {
            continue;
        };
        let taken: BlockCall = if then_ == else_ {
            then_.clone()
        } else if let Some(&value) = consts.get(cond) {
            if is_truthy(value) {
                then_.clone()
            } else {
                else_.clone()
            }
        } else {
            continue;
        };
        block.terminator = Terminator::Jump(taken);
        changed = true;
    }
    changed
}

/// Splice `b` into `a` when `a` ends in `jump b` and that is the only edge
/// into `b`
fn merge_chains(func: &mut LirFunction) -> bool {
    let cfg = Cfg::compute(func);
    let mut incoming = vec![0usize; func.blocks.len()];
    for &label in &cfg.rpo {
        for call in func.block(label).terminator.block_calls() {
            incoming[call.target.index()] += 1;
        }
    }

    let mut changed = false;
    for &a in &cfg.rpo {
        loop {
            let Terminator::Jump(call) = &func.block(a).terminator else {
                break;
            };
            let b = call.target;
            if b == a || b == func.entry || incoming[b.index()] != 1 {
                break;
            }
            let args = call.args.clone();

            let absorbed = std::mem::replace(
                func.block_mut(b),
                crate::lir::BasicBlock::new(b),
            );
            let params: FxHashMap<Reg, Reg> =
                absorbed.params.iter().copied().zip(args).collect();
            let target = func.block_mut(a);
            target.instructions.extend(absorbed.instructions);
            target.terminator = absorbed.terminator;
            if !params.is_empty() {
                func.map_all_uses(|r| params.get(&r).copied().unwrap_or(r));
            }
            // `b` keeps no edges; its successors now hang off `a`
            incoming[b.index()] = 0;
            changed = true;
        }
    }
    changed
}

fn remove_unreachable(func: &mut LirFunction) -> bool {
    let cfg = Cfg::compute(func);
    if cfg.rpo.len() == func.blocks.len() {
        return false;
    }

    let mut remap: Vec<Option<Label>> = vec![None; func.blocks.len()];
    let mut next = 0u32;
    for block in &func.blocks {
        if cfg.is_reachable(block.label) {
            remap[block.label.index()] = Some(Label(next));
            next += 1;
        }
    }

    let blocks = std::mem::take(&mut func.blocks);
    for mut block in blocks {
        let Some(label) = remap[block.label.index()] else {
            continue;
        };
        block.label = label;
        for call in block.terminator.block_calls_mut() {
            if let Some(Some(target)) = remap.get(call.target.index()) {
                call.target = *target;
            }
        }
        func.blocks.push(block);
    }
    if let Some(Some(entry)) = remap.get(func.entry.index()) {
        func.entry = *entry;
    }
    true
}
