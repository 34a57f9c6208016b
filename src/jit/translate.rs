//! LIR to Cranelift IR translation
//!
//! This module contains `FunctionTranslator`, which translates a whole
//! `LirFunction` into a Cranelift `Function`. Registers and stack slots both
//! become frontend `Variable`s; the frontend builds the final SSA form.

use rustc_hash::FxHashMap;

use cranelift_codegen::ir::condcodes::FloatCC;
use cranelift_codegen::ir::types::F64;
use cranelift_codegen::ir::{self, Function, InstBuilder, TrapCode};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext, Variable};
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Module};

use crate::image::FuncRef;
use crate::lir::{BinOp, BlockCall, CmpOp, Label, LirFunction, LirInstr, Reg, Slot, Terminator};

use super::JitError;

/// Helper to create a Variable from a register/slot index
#[inline]
fn var(n: u32) -> Variable {
    Variable::from_u32(n)
}

/// Translator for a single function
pub(crate) struct FunctionTranslator<'a> {
    module: &'a mut JITModule,
    lir: &'a LirFunction,
    /// Module function for every callee this function may call
    callees: &'a FxHashMap<FuncRef, FuncId>,
    blocks: FxHashMap<Label, ir::Block>,
    /// Incoming arguments, defined in the Cranelift entry block
    args: Vec<ir::Value>,
}

impl<'a> FunctionTranslator<'a> {
    pub(crate) fn new(
        module: &'a mut JITModule,
        lir: &'a LirFunction,
        callees: &'a FxHashMap<FuncRef, FuncId>,
    ) -> Self {
        FunctionTranslator {
            module,
            lir,
            callees,
            blocks: FxHashMap::default(),
            args: Vec::new(),
        }
    }

    fn reg_var(reg: Reg) -> Variable {
        var(reg.0)
    }

    fn slot_var(&self, slot: Slot) -> Variable {
        var(self.lir.num_regs + slot.0)
    }

    /// Translate into `func`, whose signature must already be set
    pub(crate) fn translate(
        mut self,
        func: &mut Function,
        builder_ctx: &mut FunctionBuilderContext,
    ) -> Result<(), JitError> {
        let lir = self.lir;
        let mut builder = FunctionBuilder::new(func, builder_ctx);

        for i in 0..lir.num_regs + lir.slots.len() as u32 {
            builder.declare_var(var(i), F64);
        }

        // Separate entry block so LIR blocks never carry function params
        let entry_block = builder.create_block();
        for bb in &lir.blocks {
            let cl_block = builder.create_block();
            for _ in &bb.params {
                builder.append_block_param(cl_block, F64);
            }
            self.blocks.insert(bb.label, cl_block);
        }

        builder.append_block_params_for_function_params(entry_block);
        builder.switch_to_block(entry_block);
        self.args = builder.block_params(entry_block).to_vec();
        if self.args.len() != self.lir.arity {
            return Err(JitError::InvalidLir(format!(
                "{} declares {} parameter(s) but the signature has {}",
                self.lir.name,
                self.lir.arity,
                self.args.len()
            )));
        }
        // Slots read before any store hold 0.0
        let zero = builder.ins().f64const(0.0);
        for slot in 0..self.lir.slots.len() as u32 {
            builder.def_var(self.slot_var(Slot(slot)), zero);
        }
        let first = self.block(self.lir.entry)?;
        builder.ins().jump(first, &[]);

        for bb in &lir.blocks {
            let cl_block = self.block(bb.label)?;
            builder.switch_to_block(cl_block);
            let params = builder.block_params(cl_block).to_vec();
            for (reg, value) in bb.params.iter().zip(params) {
                builder.def_var(Self::reg_var(*reg), value);
            }

            for instr in &bb.instructions {
                self.translate_instr(&mut builder, instr)?;
            }
            self.translate_terminator(&mut builder, &bb.terminator)?;
        }

        builder.seal_all_blocks();
        builder.finalize();
        Ok(())
    }

    fn block(&self, label: Label) -> Result<ir::Block, JitError> {
        self.blocks
            .get(&label)
            .copied()
            .ok_or_else(|| JitError::InvalidLir(format!("unknown block {}", label)))
    }

    /// Translate a single LIR instruction
    fn translate_instr(
        &mut self,
        builder: &mut FunctionBuilder,
        instr: &LirInstr,
    ) -> Result<(), JitError> {
        match instr {
            LirInstr::Const { dst, value } => {
                let val = builder.ins().f64const(*value);
                builder.def_var(Self::reg_var(*dst), val);
            }

            LirInstr::Param { dst, index } => {
                let val = self.args.get(*index as usize).copied().ok_or_else(|| {
                    JitError::InvalidLir(format!("parameter {} out of range", index))
                })?;
                builder.def_var(Self::reg_var(*dst), val);
            }

            LirInstr::Load { dst, slot } => {
                let val = builder.use_var(self.slot_var(*slot));
                builder.def_var(Self::reg_var(*dst), val);
            }

            LirInstr::Store { slot, src } => {
                let val = builder.use_var(Self::reg_var(*src));
                builder.def_var(self.slot_var(*slot), val);
            }

            LirInstr::BinOp { dst, op, lhs, rhs } => {
                let lhs_val = builder.use_var(Self::reg_var(*lhs));
                let rhs_val = builder.use_var(Self::reg_var(*rhs));
                let result = match op {
                    BinOp::Add => builder.ins().fadd(lhs_val, rhs_val),
                    BinOp::Sub => builder.ins().fsub(lhs_val, rhs_val),
                    BinOp::Mul => builder.ins().fmul(lhs_val, rhs_val),
                };
                builder.def_var(Self::reg_var(*dst), result);
            }

            LirInstr::Cmp { dst, op, lhs, rhs } => {
                let lhs_val = builder.use_var(Self::reg_var(*lhs));
                let rhs_val = builder.use_var(Self::reg_var(*rhs));
                let cc = match op {
                    CmpOp::Lt => FloatCC::LessThan,
                };
                let holds = builder.ins().fcmp(cc, lhs_val, rhs_val);
                let one = builder.ins().f64const(1.0);
                let zero = builder.ins().f64const(0.0);
                let result = builder.ins().select(holds, one, zero);
                builder.def_var(Self::reg_var(*dst), result);
            }

            LirInstr::Call { dst, callee, args } => {
                let func_id = self.callees.get(callee).copied().ok_or_else(|| {
                    JitError::InvalidLir(format!("call to unplanned function {}", callee))
                })?;
                let func_ref = self.module.declare_func_in_func(func_id, builder.func);
                let arg_vals: Vec<ir::Value> = args
                    .iter()
                    .map(|a| builder.use_var(Self::reg_var(*a)))
                    .collect();
                let call = builder.ins().call(func_ref, &arg_vals);
                let result = builder.inst_results(call).first().copied().ok_or_else(|| {
                    JitError::InvalidLir(format!("{} returns no value", callee))
                })?;
                builder.def_var(Self::reg_var(*dst), result);
            }
        }
        Ok(())
    }

    fn block_args(builder: &mut FunctionBuilder, call: &BlockCall) -> Vec<ir::Value> {
        call.args
            .iter()
            .map(|a| builder.use_var(Self::reg_var(*a)))
            .collect()
    }

    fn translate_terminator(
        &mut self,
        builder: &mut FunctionBuilder,
        term: &Terminator,
    ) -> Result<(), JitError> {
        match term {
            Terminator::Return(reg) => {
                let val = builder.use_var(Self::reg_var(*reg));
                builder.ins().return_(&[val]);
            }

            Terminator::Jump(call) => {
                let target = self.block(call.target)?;
                let args = Self::block_args(builder, call);
                builder.ins().jump(target, &args);
            }

            Terminator::Branch { cond, then_, else_ } => {
                let cond_val = builder.use_var(Self::reg_var(*cond));
                let then_block = self.block(then_.target)?;
                let else_block = self.block(else_.target)?;
                let then_args = Self::block_args(builder, then_);
                let else_args = Self::block_args(builder, else_);

                // Ordered: a NaN condition takes the else arm
                let zero = builder.ins().f64const(0.0);
                let truthy = builder.ins().fcmp(FloatCC::OrderedNotEqual, cond_val, zero);
                builder
                    .ins()
                    .brif(truthy, then_block, &then_args, else_block, &else_args);
            }

            Terminator::Unreachable => {
                builder.ins().trap(TrapCode::unwrap_user(1));
            }
        }
        Ok(())
    }
}
