//! AST to LIR lowering
//!
//! Lowering runs against a read-only view of the symbol table and produces
//! a detached `LirFunction`. Nothing is committed until the caller decides
//! the unit succeeded.

use rustc_hash::FxHashSet;
use tracing::trace;

use super::types::*;
use crate::ast::{Expr, Function, Prototype};
use crate::error::LowerError;
use crate::image::{EntryKind, FuncRef};
use crate::symbol::{Binding, SymbolTable};

/// A validated bodiless signature, ready to become an image entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub arity: usize,
}

/// Validate an `extern` prototype against the current bindings
pub fn lower_prototype(
    proto: &Prototype,
    symbols: &SymbolTable,
) -> Result<Declaration, LowerError> {
    check_signature(proto, symbols)?;
    Ok(Declaration {
        name: proto.name.clone(),
        arity: proto.arity(),
    })
}

/// Lower a function body.
///
/// `this` is the identity the function will receive once committed. For
/// definitions it is bound to the prototype's name inside the body so the
/// function can call itself; wrappers are never callable by name.
pub fn lower_function(
    function: &Function,
    name: &str,
    this: FuncRef,
    kind: EntryKind,
    symbols: &SymbolTable,
) -> Result<LirFunction, LowerError> {
    let proto = &function.proto;
    let this = match kind {
        EntryKind::Definition => {
            check_signature(proto, symbols)?;
            Some((
                proto.name.clone(),
                Binding {
                    func: this,
                    arity: proto.arity(),
                    kind,
                },
            ))
        }
        EntryKind::Extern | EntryKind::Anonymous => None,
    };

    let mut lowerer = Lowerer::new(name, proto.arity(), symbols, this);
    lowerer.bind_params(&proto.params);
    let result = lowerer.lower_expr(&function.body)?;
    lowerer.terminate(Terminator::Return(result));

    let func = lowerer.finish();
    trace!(
        function = name,
        blocks = func.blocks.len(),
        instructions = func.instruction_count(),
        "lowered"
    );
    Ok(func)
}

/// Duplicate parameters, and arity conflicts with a declaration in scope
fn check_signature(proto: &Prototype, symbols: &SymbolTable) -> Result<(), LowerError> {
    let mut seen = FxHashSet::default();
    for param in &proto.params {
        if !seen.insert(param.as_str()) {
            return Err(LowerError::DuplicateParameter {
                name: proto.name.clone(),
                param: param.clone(),
            });
        }
    }

    if let Some(existing) = symbols.lookup(&proto.name) {
        if existing.kind == EntryKind::Extern && existing.arity != proto.arity() {
            return Err(LowerError::ConflictingSignature {
                name: proto.name.clone(),
                declared: existing.arity,
                found: proto.arity(),
            });
        }
    }
    Ok(())
}

struct Lowerer<'a> {
    symbols: &'a SymbolTable,
    func: LirFunction,
    /// Block receiving new instructions
    current: Label,
    /// Variables in scope, innermost last
    scope: Vec<(String, Slot)>,
    this: Option<(String, Binding)>,
}

impl<'a> Lowerer<'a> {
    fn new(
        name: &str,
        arity: usize,
        symbols: &'a SymbolTable,
        this: Option<(String, Binding)>,
    ) -> Self {
        let mut func = LirFunction::new(name, arity);
        let entry = func.new_block();
        func.entry = entry;
        Lowerer {
            symbols,
            func,
            current: entry,
            scope: Vec::new(),
            this,
        }
    }

    fn finish(self) -> LirFunction {
        self.func
    }

    fn bind_params(&mut self, params: &[String]) {
        for (index, param) in params.iter().enumerate() {
            let value = self.func.new_reg();
            self.emit(LirInstr::Param {
                dst: value,
                index: index as u16,
            });
            let slot = self.func.new_slot();
            self.emit(LirInstr::Store { slot, src: value });
            self.scope.push((param.clone(), slot));
        }
    }

    fn emit(&mut self, instr: LirInstr) {
        self.func.block_mut(self.current).instructions.push(instr);
    }

    fn terminate(&mut self, terminator: Terminator) {
        self.func.block_mut(self.current).terminator = terminator;
    }

    fn switch_to(&mut self, label: Label) {
        self.current = label;
    }

    fn emit_const(&mut self, value: f64) -> Reg {
        let dst = self.func.new_reg();
        self.emit(LirInstr::Const { dst, value });
        dst
    }

    fn lookup_var(&self, name: &str) -> Option<Slot> {
        self.scope
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, slot)| *slot)
    }

    fn lookup_callee(&self, name: &str) -> Option<Binding> {
        match &self.this {
            Some((this_name, binding)) if this_name == name => Some(*binding),
            _ => self.symbols.lookup(name).copied(),
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<Reg, LowerError> {
        match expr {
            Expr::Number(value) => Ok(self.emit_const(*value)),

            Expr::Variable(name) => {
                let slot = self
                    .lookup_var(name)
                    .ok_or_else(|| LowerError::UnknownVariable { name: name.clone() })?;
                let dst = self.func.new_reg();
                self.emit(LirInstr::Load { dst, slot });
                Ok(dst)
            }

            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                let dst = self.func.new_reg();
                let instr = match op {
                    '+' => LirInstr::BinOp {
                        dst,
                        op: BinOp::Add,
                        lhs,
                        rhs,
                    },
                    '-' => LirInstr::BinOp {
                        dst,
                        op: BinOp::Sub,
                        lhs,
                        rhs,
                    },
                    '*' => LirInstr::BinOp {
                        dst,
                        op: BinOp::Mul,
                        lhs,
                        rhs,
                    },
                    '<' => LirInstr::Cmp {
                        dst,
                        op: CmpOp::Lt,
                        lhs,
                        rhs,
                    },
                    other => return Err(LowerError::UnknownOperator { op: *other }),
                };
                self.emit(instr);
                Ok(dst)
            }

            Expr::Call { callee, args } => {
                let binding = self
                    .lookup_callee(callee)
                    .ok_or_else(|| LowerError::UnknownFunction {
                        name: callee.clone(),
                    })?;
                if binding.arity != args.len() {
                    return Err(LowerError::ArityMismatch {
                        name: callee.clone(),
                        expected: binding.arity,
                        got: args.len(),
                    });
                }
                let args = args
                    .iter()
                    .map(|arg| self.lower_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let dst = self.func.new_reg();
                self.emit(LirInstr::Call {
                    dst,
                    callee: binding.func,
                    args,
                });
                Ok(dst)
            }

            Expr::If { cond, then, else_ } => self.lower_if(cond, then, else_),

            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => self.lower_for(var, start, end, step.as_deref(), body),
        }
    }

    fn lower_if(&mut self, cond: &Expr, then: &Expr, else_: &Expr) -> Result<Reg, LowerError> {
        let cond = self.lower_expr(cond)?;

        let then_block = self.func.new_block();
        let else_block = self.func.new_block();
        let merge_block = self.func.new_block();
        let result = self.func.new_reg();
        self.func.block_mut(merge_block).params.push(result);

        self.terminate(Terminator::Branch {
            cond,
            then_: BlockCall::new(then_block),
            else_: BlockCall::new(else_block),
        });

        // Either arm may open blocks of its own; jump from wherever it ends
        self.switch_to(then_block);
        let then_value = self.lower_expr(then)?;
        self.terminate(Terminator::Jump(BlockCall::with_args(
            merge_block,
            vec![then_value],
        )));

        self.switch_to(else_block);
        let else_value = self.lower_expr(else_)?;
        self.terminate(Terminator::Jump(BlockCall::with_args(
            merge_block,
            vec![else_value],
        )));

        self.switch_to(merge_block);
        Ok(result)
    }

    /// Body, step and end condition run in that order on every iteration;
    /// the end condition sees the value before the increment.
    fn lower_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> Result<Reg, LowerError> {
        let start = self.lower_expr(start)?;
        let slot = self.func.new_slot();
        self.emit(LirInstr::Store { slot, src: start });

        let loop_block = self.func.new_block();
        self.terminate(Terminator::Jump(BlockCall::new(loop_block)));
        self.switch_to(loop_block);

        self.scope.push((var.to_string(), slot));
        let lowered = self.lower_loop_body(slot, end, step, body);
        self.scope.pop();
        let keep_going = lowered?;

        let after_block = self.func.new_block();
        self.terminate(Terminator::Branch {
            cond: keep_going,
            then_: BlockCall::new(loop_block),
            else_: BlockCall::new(after_block),
        });
        self.switch_to(after_block);
        Ok(self.emit_const(0.0))
    }

    fn lower_loop_body(
        &mut self,
        slot: Slot,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> Result<Reg, LowerError> {
        self.lower_expr(body)?;
        let step = match step {
            Some(step) => self.lower_expr(step)?,
            None => self.emit_const(1.0),
        };
        let keep_going = self.lower_expr(end)?;

        let current = self.func.new_reg();
        self.emit(LirInstr::Load { dst: current, slot });
        let next = self.func.new_reg();
        self.emit(LirInstr::BinOp {
            dst: next,
            op: BinOp::Add,
            lhs: current,
            rhs: step,
        });
        self.emit(LirInstr::Store { slot, src: next });
        Ok(keep_going)
    }
}
