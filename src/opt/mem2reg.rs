//! Promotion of private stack slots to SSA registers
//!
//! Classic construction: block parameters are placed at the iterated
//! dominance frontier of every block that stores to a slot, then a walk over
//! the dominator tree renames loads to the reaching value. A load with no
//! reaching store reads 0.0.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::lir::{Cfg, Label, LirFunction, LirInstr, Reg, Slot, SlotHint, Terminator};

use super::{prune_trivial_params, FunctionPass, Substitution};

pub struct Mem2Reg;

impl FunctionPass for Mem2Reg {
    fn name(&self) -> &'static str {
        "mem2reg"
    }

    fn run(&mut self, func: &mut LirFunction) -> bool {
        let promotable: FxHashSet<Slot> = func
            .slots
            .iter()
            .enumerate()
            .filter(|(_, hint)| **hint == SlotHint::Private)
            .map(|(i, _)| Slot(i as u32))
            .collect();
        if promotable.is_empty() {
            return false;
        }

        let cfg = Cfg::compute(func);
        clear_unreachable(func, &cfg);

        let phis = place_params(func, &cfg, &promotable);
        rename(func, &cfg, &promotable, &phis);
        compact_slots(func, &promotable);
        prune_trivial_params(func);
        true
    }
}

/// Blocks nobody can reach keep their label but lose their contents
fn clear_unreachable(func: &mut LirFunction, cfg: &Cfg) {
    for block in &mut func.blocks {
        if !cfg.is_reachable(block.label) {
            block.params.clear();
            block.instructions.clear();
            block.terminator = Terminator::Unreachable;
        }
    }
}

/// New block parameters per block, in the order they were appended
type PhiMap = FxHashMap<Label, Vec<(Slot, Reg)>>;

fn place_params(func: &mut LirFunction, cfg: &Cfg, promotable: &FxHashSet<Slot>) -> PhiMap {
    let frontiers = cfg.frontiers();

    // Defining blocks per slot, in slot order for a deterministic result
    let mut def_blocks: Vec<Vec<Label>> = vec![Vec::new(); func.slots.len()];
    for &label in &cfg.rpo {
        for instr in &func.block(label).instructions {
            if let LirInstr::Store { slot, .. } = instr {
                if promotable.contains(slot) && !def_blocks[slot.index()].contains(&label) {
                    def_blocks[slot.index()].push(label);
                }
            }
        }
    }

    let mut phis = PhiMap::default();
    for (index, defs) in def_blocks.into_iter().enumerate() {
        let slot = Slot(index as u32);
        let mut has_param: FxHashSet<Label> = FxHashSet::default();
        let mut worklist = defs;
        let mut queued: FxHashSet<Label> = worklist.iter().copied().collect();
        while let Some(block) = worklist.pop() {
            for &frontier in &frontiers[block.index()] {
                if !has_param.insert(frontier) {
                    continue;
                }
                let param = func.new_reg();
                func.block_mut(frontier).params.push(param);
                phis.entry(frontier).or_default().push((slot, param));
                if queued.insert(frontier) {
                    worklist.push(frontier);
                }
            }
        }
    }
    phis
}

fn rename(func: &mut LirFunction, cfg: &Cfg, promotable: &FxHashSet<Slot>, phis: &PhiMap) {
    let children = cfg.dom_children();
    let mut stacks: Vec<Vec<Reg>> = vec![Vec::new(); func.slots.len()];
    let mut subst = Substitution::default();
    let undef = func.new_reg();
    let mut undef_used = false;

    enum Visit {
        Enter(Label),
        Exit(Vec<Slot>),
    }
    let mut visits = vec![Visit::Enter(func.entry)];

    while let Some(visit) = visits.pop() {
        let label = match visit {
            Visit::Enter(label) => label,
            Visit::Exit(pushed) => {
                for slot in pushed {
                    stacks[slot.index()].pop();
                }
                continue;
            }
        };

        let mut pushed = Vec::new();
        if let Some(params) = phis.get(&label) {
            for &(slot, param) in params {
                stacks[slot.index()].push(param);
                pushed.push(slot);
            }
        }

        let block = func.block_mut(label);
        let instructions = std::mem::take(&mut block.instructions);
        let mut kept = Vec::with_capacity(instructions.len());
        for instr in instructions {
            match instr {
                LirInstr::Load { dst, slot } if promotable.contains(&slot) => {
                    let value = match stacks[slot.index()].last() {
                        Some(&value) => value,
                        None => {
                            undef_used = true;
                            undef
                        }
                    };
                    subst.insert(dst, value);
                }
                LirInstr::Store { slot, src } if promotable.contains(&slot) => {
                    stacks[slot.index()].push(subst.resolve(src));
                    pushed.push(slot);
                }
                other => kept.push(other),
            }
        }
        block.instructions = kept;

        // Feed the current value of each slot to successor parameters
        for call in block.terminator.block_calls_mut() {
            if let Some(params) = phis.get(&call.target) {
                for &(slot, _) in params {
                    let value = match stacks[slot.index()].last() {
                        Some(&value) => value,
                        None => {
                            undef_used = true;
                            undef
                        }
                    };
                    call.args.push(value);
                }
            }
        }

        visits.push(Visit::Exit(pushed));
        for &child in children[label.index()].iter().rev() {
            visits.push(Visit::Enter(child));
        }
    }

    if undef_used {
        let entry = func.entry;
        func.block_mut(entry).instructions.insert(
            0,
            LirInstr::Const {
                dst: undef,
                value: 0.0,
            },
        );
    }
    subst.apply(func);
}

/// Drop promoted slots from the slot table and renumber the survivors
fn compact_slots(func: &mut LirFunction, promotable: &FxHashSet<Slot>) {
    let mut remap: Vec<Option<Slot>> = Vec::with_capacity(func.slots.len());
    let mut kept = Vec::new();
    for (index, hint) in func.slots.iter().enumerate() {
        if promotable.contains(&Slot(index as u32)) {
            remap.push(None);
        } else {
            remap.push(Some(Slot(kept.len() as u32)));
            kept.push(*hint);
        }
    }
    func.slots = kept;

    for block in &mut func.blocks {
        for instr in &mut block.instructions {
            if let LirInstr::Load { slot, .. } | LirInstr::Store { slot, .. } = instr {
                if let Some(Some(new)) = remap.get(slot.index()) {
                    *slot = *new;
                }
            }
        }
    }
}
