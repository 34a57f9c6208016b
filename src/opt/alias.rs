//! Stack slot classification

use crate::lir::{LirFunction, LirInstr, SlotHint};

use super::FunctionPass;

/// Marks every slot that is only touched by direct `Load`/`Store` as
/// `Private`; anything else is `MayAlias`. Only private slots get promoted.
pub struct AliasHints;

impl FunctionPass for AliasHints {
    fn name(&self) -> &'static str {
        "alias-hints"
    }

    fn run(&mut self, func: &mut LirFunction) -> bool {
        let mut hints = vec![SlotHint::Private; func.slots.len()];
        for block in &func.blocks {
            for instr in &block.instructions {
                let slot = match instr {
                    LirInstr::Load { slot, .. } | LirInstr::Store { slot, .. } => *slot,
                    _ => continue,
                };
                // A slot id outside the table cannot be tracked
                if slot.index() >= hints.len() {
                    hints.resize(slot.index() + 1, SlotHint::MayAlias);
                    hints[slot.index()] = SlotHint::MayAlias;
                }
            }
        }

        let changed = hints != func.slots;
        func.slots = hints;
        changed
    }
}
