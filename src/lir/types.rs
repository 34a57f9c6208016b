//! LIR type definitions

use smallvec::SmallVec;

use crate::image::FuncRef;

/// Virtual register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(pub u32);

impl Reg {
    pub fn new(id: u32) -> Self {
        Reg(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block label; always equal to the block's index in `LirFunction::blocks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl Label {
    pub fn new(id: u32) -> Self {
        Label(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Function-local stack slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub u32);

impl Slot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Alias classification of a stack slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotHint {
    /// Not analyzed yet
    Unknown,
    /// Only touched by direct loads and stores; safe to promote
    Private,
    /// Accessed in a way the promoter cannot see through
    MayAlias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
}

impl BinOp {
    pub fn is_commutative(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul)
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinOp::Add => lhs + rhs,
            BinOp::Sub => lhs - rhs,
            BinOp::Mul => lhs * rhs,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "fadd",
            BinOp::Sub => "fsub",
            BinOp::Mul => "fmul",
        }
    }
}

/// Comparison; the result is 1.0 when it holds and 0.0 otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
}

impl CmpOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        let holds = match self {
            CmpOp::Lt => lhs < rhs,
        };
        if holds {
            1.0
        } else {
            0.0
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            CmpOp::Lt => "fcmp.lt",
        }
    }
}

/// Branch condition: ordered and different from 0.0, so NaN is false
pub fn is_truthy(value: f64) -> bool {
    !value.is_nan() && value != 0.0
}

/// Edge to a block, passing values for its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCall {
    pub target: Label,
    pub args: Vec<Reg>,
}

impl BlockCall {
    pub fn new(target: Label) -> Self {
        BlockCall {
            target,
            args: Vec::new(),
        }
    }

    pub fn with_args(target: Label, args: Vec<Reg>) -> Self {
        BlockCall { target, args }
    }
}

/// LIR instruction (SSA form - each register assigned exactly once)
#[derive(Debug, Clone, PartialEq)]
pub enum LirInstr {
    Const { dst: Reg, value: f64 },
    /// Read incoming argument `index`
    Param { dst: Reg, index: u16 },
    Load { dst: Reg, slot: Slot },
    Store { slot: Slot, src: Reg },
    BinOp { dst: Reg, op: BinOp, lhs: Reg, rhs: Reg },
    Cmp { dst: Reg, op: CmpOp, lhs: Reg, rhs: Reg },
    Call { dst: Reg, callee: FuncRef, args: Vec<Reg> },
}

impl LirInstr {
    pub fn dst(&self) -> Option<Reg> {
        match self {
            LirInstr::Const { dst, .. }
            | LirInstr::Param { dst, .. }
            | LirInstr::Load { dst, .. }
            | LirInstr::BinOp { dst, .. }
            | LirInstr::Cmp { dst, .. }
            | LirInstr::Call { dst, .. } => Some(*dst),
            LirInstr::Store { .. } => None,
        }
    }

    pub fn uses(&self) -> SmallVec<[Reg; 4]> {
        match self {
            LirInstr::Const { .. } | LirInstr::Param { .. } | LirInstr::Load { .. } => {
                SmallVec::new()
            }
            LirInstr::Store { src, .. } => smallvec::smallvec![*src],
            LirInstr::BinOp { lhs, rhs, .. } | LirInstr::Cmp { lhs, rhs, .. } => {
                smallvec::smallvec![*lhs, *rhs]
            }
            LirInstr::Call { args, .. } => args.iter().copied().collect(),
        }
    }

    pub fn map_uses(&mut self, mut f: impl FnMut(Reg) -> Reg) {
        match self {
            LirInstr::Const { .. } | LirInstr::Param { .. } | LirInstr::Load { .. } => {}
            LirInstr::Store { src, .. } => *src = f(*src),
            LirInstr::BinOp { lhs, rhs, .. } | LirInstr::Cmp { lhs, rhs, .. } => {
                *lhs = f(*lhs);
                *rhs = f(*rhs);
            }
            LirInstr::Call { args, .. } => {
                for arg in args {
                    *arg = f(*arg);
                }
            }
        }
    }

    /// No side effects and no dependence on memory: may be removed when
    /// unused and merged with an identical instruction
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            LirInstr::Const { .. }
                | LirInstr::Param { .. }
                | LirInstr::BinOp { .. }
                | LirInstr::Cmp { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Return(Reg),
    Jump(BlockCall),
    /// Takes `then_` when `cond` is truthy (see `is_truthy`)
    Branch {
        cond: Reg,
        then_: BlockCall,
        else_: BlockCall,
    },
    Unreachable,
}

impl Terminator {
    pub fn successors(&self) -> SmallVec<[Label; 2]> {
        match self {
            Terminator::Jump(call) => smallvec::smallvec![call.target],
            Terminator::Branch { then_, else_, .. } => {
                smallvec::smallvec![then_.target, else_.target]
            }
            Terminator::Return(_) | Terminator::Unreachable => SmallVec::new(),
        }
    }

    pub fn block_calls(&self) -> SmallVec<[&BlockCall; 2]> {
        match self {
            Terminator::Jump(call) => smallvec::smallvec![call],
            Terminator::Branch { then_, else_, .. } => smallvec::smallvec![then_, else_],
            Terminator::Return(_) | Terminator::Unreachable => SmallVec::new(),
        }
    }

    pub fn block_calls_mut(&mut self) -> SmallVec<[&mut BlockCall; 2]> {
        match self {
            Terminator::Jump(call) => smallvec::smallvec![call],
            Terminator::Branch { then_, else_, .. } => smallvec::smallvec![then_, else_],
            Terminator::Return(_) | Terminator::Unreachable => SmallVec::new(),
        }
    }

    pub fn uses(&self) -> SmallVec<[Reg; 4]> {
        let mut out = SmallVec::new();
        match self {
            Terminator::Return(reg) => out.push(*reg),
            Terminator::Branch { cond, .. } => out.push(*cond),
            Terminator::Jump(_) | Terminator::Unreachable => {}
        }
        for call in self.block_calls() {
            out.extend(call.args.iter().copied());
        }
        out
    }

    pub fn map_uses(&mut self, mut f: impl FnMut(Reg) -> Reg) {
        match self {
            Terminator::Return(reg) => *reg = f(*reg),
            Terminator::Branch { cond, .. } => *cond = f(*cond),
            Terminator::Jump(_) | Terminator::Unreachable => {}
        }
        for call in self.block_calls_mut() {
            for arg in call.args.iter_mut() {
                *arg = f(*arg);
            }
        }
    }
}

/// A basic block - parameters, straight-line instructions, one terminator
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: Label,
    pub params: Vec<Reg>,
    pub instructions: Vec<LirInstr>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(label: Label) -> Self {
        BasicBlock {
            label,
            params: Vec::new(),
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
        }
    }
}

/// A LIR function (compilation unit)
#[derive(Debug, Clone, PartialEq)]
pub struct LirFunction {
    /// Source-level name (for dumps)
    pub name: String,
    pub arity: usize,
    pub blocks: Vec<BasicBlock>,
    pub entry: Label,
    /// Number of registers allocated so far
    pub num_regs: u32,
    /// One hint per stack slot, indexed by `Slot`
    pub slots: Vec<SlotHint>,
}

impl LirFunction {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        LirFunction {
            name: name.into(),
            arity,
            blocks: Vec::new(),
            entry: Label(0),
            num_regs: 0,
            slots: Vec::new(),
        }
    }

    pub fn new_reg(&mut self) -> Reg {
        let reg = Reg(self.num_regs);
        self.num_regs += 1;
        reg
    }

    pub fn new_slot(&mut self) -> Slot {
        let slot = Slot(self.slots.len() as u32);
        self.slots.push(SlotHint::Unknown);
        slot
    }

    pub fn new_block(&mut self) -> Label {
        let label = Label(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(label));
        label
    }

    pub fn block(&self, label: Label) -> &BasicBlock {
        &self.blocks[label.index()]
    }

    pub fn block_mut(&mut self, label: Label) -> &mut BasicBlock {
        &mut self.blocks[label.index()]
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }

    /// Rewrite every register use in the function
    pub fn map_all_uses(&mut self, mut f: impl FnMut(Reg) -> Reg) {
        for block in &mut self.blocks {
            for instr in &mut block.instructions {
                instr.map_uses(&mut f);
            }
            block.terminator.map_uses(&mut f);
        }
    }
}
