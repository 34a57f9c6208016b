//! Control-flow analyses over a `LirFunction`
//!
//! Predecessors, reverse postorder, immediate dominators (Cooper, Harvey &
//! Kennedy's iterative algorithm), the dominator tree and dominance
//! frontiers. Blocks unreachable from the entry have no dominator and are
//! absent from `rpo`.

use smallvec::SmallVec;

use super::types::{Label, LirFunction};

#[derive(Debug, Clone)]
pub struct Cfg {
    pub preds: Vec<SmallVec<[Label; 2]>>,
    pub succs: Vec<SmallVec<[Label; 2]>>,
    pub rpo: Vec<Label>,
    idom: Vec<Option<Label>>,
    rpo_index: Vec<usize>,
}

impl Cfg {
    pub fn compute(func: &LirFunction) -> Self {
        let n = func.blocks.len();
        let succs: Vec<SmallVec<[Label; 2]>> = func
            .blocks
            .iter()
            .map(|b| b.terminator.successors())
            .collect();

        let rpo = reverse_postorder(func.entry, &succs);
        let mut rpo_index = vec![usize::MAX; n];
        for (i, b) in rpo.iter().enumerate() {
            rpo_index[b.index()] = i;
        }

        // Only edges from reachable blocks count
        let mut preds: Vec<SmallVec<[Label; 2]>> = vec![SmallVec::new(); n];
        for &b in &rpo {
            for &s in &succs[b.index()] {
                if !preds[s.index()].contains(&b) {
                    preds[s.index()].push(b);
                }
            }
        }

        let idom = compute_idom(func.entry, &rpo, &preds, &rpo_index);

        Cfg {
            preds,
            succs,
            rpo,
            idom,
            rpo_index,
        }
    }

    pub fn is_reachable(&self, block: Label) -> bool {
        self.rpo_index
            .get(block.index())
            .is_some_and(|i| *i != usize::MAX)
    }

    /// Immediate dominator; the entry is its own dominator
    pub fn idom(&self, block: Label) -> Option<Label> {
        self.idom.get(block.index()).copied().flatten()
    }

    pub fn dominates(&self, a: Label, b: Label) -> bool {
        if !self.is_reachable(b) {
            return false;
        }
        let mut cur = b;
        loop {
            if cur == a {
                return true;
            }
            match self.idom(cur) {
                Some(parent) if parent != cur => cur = parent,
                _ => return false,
            }
        }
    }

    /// Dominator-tree children of every block, in reverse postorder
    pub fn dom_children(&self) -> Vec<Vec<Label>> {
        let mut children = vec![Vec::new(); self.idom.len()];
        for &b in &self.rpo {
            if let Some(parent) = self.idom(b) {
                if parent != b {
                    children[parent.index()].push(b);
                }
            }
        }
        children
    }

    /// Dominance frontier of every block
    pub fn frontiers(&self) -> Vec<SmallVec<[Label; 4]>> {
        let mut df: Vec<SmallVec<[Label; 4]>> = vec![SmallVec::new(); self.idom.len()];
        for &b in &self.rpo {
            let preds = &self.preds[b.index()];
            if preds.len() < 2 {
                continue;
            }
            let Some(b_idom) = self.idom(b) else {
                continue;
            };
            for &p in preds {
                let mut runner = p;
                while runner != b_idom {
                    if !df[runner.index()].contains(&b) {
                        df[runner.index()].push(b);
                    }
                    match self.idom(runner) {
                        Some(next) if next != runner => runner = next,
                        _ => break,
                    }
                }
            }
        }
        df
    }
}

fn reverse_postorder(entry: Label, succs: &[SmallVec<[Label; 2]>]) -> Vec<Label> {
    let n = succs.len();
    if entry.index() >= n {
        return Vec::new();
    }
    let mut seen = vec![false; n];
    let mut post = Vec::with_capacity(n);
    // Explicit stack of (block, next successor index)
    let mut stack: Vec<(Label, usize)> = vec![(entry, 0)];
    seen[entry.index()] = true;
    while let Some((block, next)) = stack.pop() {
        if let Some(&succ) = succs[block.index()].get(next) {
            stack.push((block, next + 1));
            if !seen[succ.index()] {
                seen[succ.index()] = true;
                stack.push((succ, 0));
            }
        } else {
            post.push(block);
        }
    }
    post.reverse();
    post
}

fn compute_idom(
    entry: Label,
    rpo: &[Label],
    preds: &[SmallVec<[Label; 2]>],
    rpo_index: &[usize],
) -> Vec<Option<Label>> {
    let n = preds.len();
    let mut idom: Vec<Option<Label>> = vec![None; n];
    if rpo.is_empty() {
        return idom;
    }
    idom[entry.index()] = Some(entry);

    let intersect = |mut a: Label, mut b: Label, idom: &[Option<Label>]| -> Label {
        while a != b {
            while rpo_index[a.index()] > rpo_index[b.index()] {
                match idom[a.index()] {
                    Some(up) => a = up,
                    None => return b,
                }
            }
            while rpo_index[b.index()] > rpo_index[a.index()] {
                match idom[b.index()] {
                    Some(up) => b = up,
                    None => return a,
                }
            }
        }
        a
    };

    let mut changed = true;
    while changed {
        changed = false;
        for &b in rpo.iter().skip(1) {
            let mut processed = preds[b.index()]
                .iter()
                .copied()
                .filter(|p| idom[p.index()].is_some());
            let Some(mut new_idom) = processed.next() else {
                continue;
            };
            for p in processed {
                new_idom = intersect(p, new_idom, &idom);
            }
            if idom[b.index()] != Some(new_idom) {
                idom[b.index()] = Some(new_idom);
                changed = true;
            }
        }
    }
    idom
}
