//! LIR optimization pipeline
//!
//! Every pass rewrites one `LirFunction` in place and must leave it
//! behaviourally equivalent: same return value and same sequence of calls
//! for every input. Passes keep no state between runs.

mod alias;
mod gvn;
mod instcombine;
mod mem2reg;
mod reassociate;
mod simplify_cfg;

pub use alias::AliasHints;
pub use gvn::Gvn;
pub use instcombine::InstCombine;
pub use mem2reg::Mem2Reg;
pub use reassociate::Reassociate;
pub use simplify_cfg::SimplifyCfg;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::lir::{LirFunction, Reg};

/// A transformation over a single function.
pub trait FunctionPass {
    /// Short name used in logs and dumps
    fn name(&self) -> &'static str;

    /// Rewrite `func`; returns whether anything changed
    fn run(&mut self, func: &mut LirFunction) -> bool;
}

/// Ordered sequence of function passes.
pub struct PassManager {
    passes: Vec<Box<dyn FunctionPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        PassManager { passes: Vec::new() }
    }

    /// The pipeline every session runs:
    /// alias hints, promotion to SSA, local simplification, operand
    /// canonicalization, redundancy elimination, control-flow cleanup
    pub fn standard() -> Self {
        let mut pm = PassManager::new();
        pm.add_pass(AliasHints);
        pm.add_pass(Mem2Reg);
        pm.add_pass(InstCombine);
        pm.add_pass(Reassociate);
        pm.add_pass(Gvn);
        pm.add_pass(SimplifyCfg);
        pm
    }

    pub fn add_pass(&mut self, pass: impl FunctionPass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes in order; returns whether any of them changed `func`
    pub fn run(&mut self, func: &mut LirFunction) -> bool {
        let before = func.instruction_count();
        let mut changed = false;
        for pass in &mut self.passes {
            let pass_changed = pass.run(func);
            trace!(pass = pass.name(), changed = pass_changed, function = %func.name, "pass finished");
            changed |= pass_changed;
        }
        debug!(
            function = %func.name,
            before,
            after = func.instruction_count(),
            "optimized"
        );
        changed
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending register replacements, applied to the whole function at once
#[derive(Debug, Default)]
struct Substitution {
    map: FxHashMap<Reg, Reg>,
}

impl Substitution {
    fn insert(&mut self, from: Reg, to: Reg) {
        let to = self.resolve(to);
        if from != to {
            self.map.insert(from, to);
        }
    }

    /// Follow replacement chains to the final register
    fn resolve(&self, mut reg: Reg) -> Reg {
        while let Some(&next) = self.map.get(&reg) {
            reg = next;
        }
        reg
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn apply(&self, func: &mut LirFunction) {
        if !self.is_empty() {
            func.map_all_uses(|r| self.resolve(r));
        }
    }
}

/// Drop block parameters that always receive the same value (or
/// themselves), forwarding that value to every use.
fn prune_trivial_params(func: &mut LirFunction) -> bool {
    let mut changed = false;
    'search: loop {
        for b in 0..func.blocks.len() {
            let label = func.blocks[b].label;
            if label == func.entry {
                continue;
            }
            for i in 0..func.blocks[b].params.len() {
                let param = func.blocks[b].params[i];
                let mut only: Option<Reg> = None;
                let mut trivial = true;
                for block in &func.blocks {
                    for call in block.terminator.block_calls() {
                        if call.target != label {
                            continue;
                        }
                        let Some(&arg) = call.args.get(i) else {
                            continue;
                        };
                        if arg == param {
                            continue;
                        }
                        match only {
                            None => only = Some(arg),
                            Some(seen) if seen == arg => {}
                            Some(_) => trivial = false,
                        }
                    }
                }
                let Some(value) = only.filter(|_| trivial) else {
                    continue;
                };

                func.blocks[b].params.remove(i);
                for block in &mut func.blocks {
                    for call in block.terminator.block_calls_mut() {
                        if call.target == label && i < call.args.len() {
                            call.args.remove(i);
                        }
                    }
                }
                func.map_all_uses(|r| if r == param { value } else { r });
                changed = true;
                continue 'search;
            }
        }
        return changed;
    }
}
