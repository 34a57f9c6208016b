//! JIT backend: ProgramImage -> Cranelift IR -> native code
//!
//! `resolve` works in two phases. Planning walks the call graph from the
//! requested function, collecting every body not compiled yet and linking
//! every declaration it meets; it touches nothing and fails with
//! `UnresolvedSymbol` when a declaration links to nothing. Commit then
//! declares and translates the whole batch, and only once every body has
//! translated does it define and finalize them. A body that fails to
//! translate leaves nothing defined, so the rest of the image stays
//! compilable. Definition itself only fails if Cranelift's verifier rejects
//! translated code, which is an internal error.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use cranelift_codegen::ir::types::F64;
use cranelift_codegen::ir::{AbiParam, Signature, UserFuncName};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_frontend::FunctionBuilderContext;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module};

use crate::image::{EntryKind, FuncRef, ProgramImage};
use crate::lir::LirInstr;

use super::code::{CompiledCode, EntryPoint};
use super::runtime::{self, HostFn};
use super::translate::FunctionTranslator;
use super::JitError;

/// What a declaration was linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Function(FuncRef),
    Host(&'static str),
}

/// Work found by planning: bodies to compile and declarations to link
#[derive(Debug, Default)]
struct Plan {
    bodies: Vec<FuncRef>,
    links: Vec<(FuncRef, Link)>,
}

/// Session-long native code generator
pub struct JitBackend {
    module: JITModule,
    builder_ctx: FunctionBuilderContext,
    /// Module function of every compiled body
    func_ids: FxHashMap<FuncRef, FuncId>,
    code: FxHashMap<FuncRef, CompiledCode>,
    /// Declarations linked so far; a link never changes once made
    links: FxHashMap<FuncRef, Link>,
    /// Host functions imported into the module so far
    host_ids: FxHashMap<&'static str, FuncId>,
}

impl JitBackend {
    /// Set up Cranelift for the host target
    pub fn new() -> Result<Self, JitError> {
        let mut flag_builder = settings::builder();
        flag_builder
            .set("use_colocated_libcalls", "false")
            .map_err(|e| JitError::Target(e.to_string()))?;
        flag_builder
            .set("is_pic", "false")
            .map_err(|e| JitError::Target(e.to_string()))?;
        flag_builder
            .set("opt_level", "speed")
            .map_err(|e| JitError::Target(e.to_string()))?;

        let isa_builder = cranelift_native::builder().map_err(|e| JitError::Target(e.to_string()))?;
        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(|e| JitError::Target(e.to_string()))?;

        let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());

        // Register host functions under private names
        for (name, host) in runtime::HOST_FUNCTIONS {
            builder.symbol(runtime::host_symbol(name), host.as_ptr());
        }

        let module = JITModule::new(builder);
        debug!("jit backend ready");

        Ok(JitBackend {
            module,
            builder_ctx: FunctionBuilderContext::new(),
            func_ids: FxHashMap::default(),
            code: FxHashMap::default(),
            links: FxHashMap::default(),
            host_ids: FxHashMap::default(),
        })
    }

    /// Whether `func` already has native code
    pub fn is_compiled(&self, func: FuncRef) -> bool {
        self.code.contains_key(&func)
    }

    /// Number of functions compiled so far
    pub fn compiled_count(&self) -> usize {
        self.code.len()
    }

    /// Make `func` and everything it can reach executable.
    ///
    /// Idempotent: a second call for the same identity compiles nothing.
    pub fn resolve(&mut self, image: &ProgramImage, func: FuncRef) -> Result<EntryPoint, JitError> {
        let entry = image
            .get(func)
            .ok_or_else(|| JitError::InvalidLir(format!("{} is not in the image", func)))?;
        if entry.is_declaration() {
            return Err(JitError::InvalidLir(format!(
                "{} ({}) has no body to run",
                func, entry.name
            )));
        }

        if !self.is_compiled(func) {
            let plan = self.plan(image, func)?;
            self.commit(image, plan)?;
        }
        Ok(EntryPoint::new(func))
    }

    /// Run a zero-argument entry point
    pub fn invoke(&self, entry: EntryPoint) -> Result<f64, JitError> {
        let code = self.code.get(&entry.func()).ok_or_else(|| {
            JitError::InvalidLir(format!("{} is not compiled", entry.func()))
        })?;
        if code.arity != 0 {
            return Err(JitError::InvalidLir(format!(
                "{} takes {} argument(s)",
                entry.func(),
                code.arity
            )));
        }
        trace!(func = %entry.func(), "invoking");
        // Safety: the pointer was finalized by `self.module`, which is
        // still alive, and the function takes no arguments.
        Ok(unsafe { code.call0() })
    }

    fn plan(&self, image: &ProgramImage, root: FuncRef) -> Result<Plan, JitError> {
        let mut plan = Plan::default();
        let mut seen: FxHashSet<FuncRef> = FxHashSet::default();
        let mut stack = vec![root];

        while let Some(func) = stack.pop() {
            if !seen.insert(func) || self.is_compiled(func) {
                continue;
            }
            let entry = image
                .get(func)
                .ok_or_else(|| JitError::InvalidLir(format!("{} is not in the image", func)))?;

            match &entry.body {
                Some(body) => {
                    plan.bodies.push(func);
                    for block in &body.blocks {
                        for instr in &block.instructions {
                            if let LirInstr::Call { callee, .. } = instr {
                                stack.push(*callee);
                            }
                        }
                    }
                }
                None => {
                    let link = match self.links.get(&func) {
                        Some(link) => *link,
                        None => {
                            let link = link_declaration(image, func)?;
                            plan.links.push((func, link));
                            link
                        }
                    };
                    if let Link::Function(target) = link {
                        stack.push(target);
                    }
                }
            }
        }
        Ok(plan)
    }

    fn signature(&self, arity: usize) -> Signature {
        let mut sig = self.module.make_signature();
        for _ in 0..arity {
            sig.params.push(AbiParam::new(F64));
        }
        sig.returns.push(AbiParam::new(F64));
        sig
    }

    fn host_id(&mut self, name: &'static str, host: HostFn) -> Result<FuncId, JitError> {
        if let Some(id) = self.host_ids.get(name) {
            return Ok(*id);
        }
        let sig = self.signature(host.arity());
        let id = self
            .module
            .declare_function(&runtime::host_symbol(name), Linkage::Import, &sig)?;
        self.host_ids.insert(name, id);
        Ok(id)
    }

    /// Module function a call to `callee` ends up in
    fn target_id(
        &mut self,
        callee: FuncRef,
        pending_ids: &FxHashMap<FuncRef, FuncId>,
        pending_links: &FxHashMap<FuncRef, Link>,
    ) -> Result<FuncId, JitError> {
        let body_id = |func: FuncRef| {
            self.func_ids
                .get(&func)
                .or_else(|| pending_ids.get(&func))
                .copied()
        };
        if let Some(id) = body_id(callee) {
            return Ok(id);
        }
        let link = self
            .links
            .get(&callee)
            .or_else(|| pending_links.get(&callee))
            .copied()
            .ok_or_else(|| JitError::InvalidLir(format!("{} was not planned", callee)))?;
        match link {
            Link::Function(target) => body_id(target)
                .ok_or_else(|| JitError::InvalidLir(format!("{} was not planned", target))),
            Link::Host(name) => {
                let (name, host) = runtime::HOST_FUNCTIONS
                    .iter()
                    .find(|(host_name, _)| *host_name == name)
                    .copied()
                    .ok_or_else(|| JitError::InvalidLir(format!("unknown host function {}", name)))?;
                self.host_id(name, host)
            }
        }
    }

    fn commit(&mut self, image: &ProgramImage, plan: Plan) -> Result<(), JitError> {
        let pending_links: FxHashMap<FuncRef, Link> = plan.links.iter().copied().collect();

        // Declare every new body first so they can call each other
        let mut pending_ids: FxHashMap<FuncRef, FuncId> = FxHashMap::default();
        for &func in &plan.bodies {
            let entry = image
                .get(func)
                .ok_or_else(|| JitError::InvalidLir(format!("{} is not in the image", func)))?;
            let sig = self.signature(entry.arity);
            let id = self
                .module
                .declare_function(&entry.symbol, Linkage::Local, &sig)?;
            pending_ids.insert(func, id);
        }

        // Translate the whole batch before defining any of it, so an invalid
        // body leaves the module with declarations only
        let mut translated = Vec::with_capacity(plan.bodies.len());
        for &func in &plan.bodies {
            let entry = image
                .get(func)
                .ok_or_else(|| JitError::InvalidLir(format!("{} is not in the image", func)))?;
            let body = entry
                .body
                .as_ref()
                .ok_or_else(|| JitError::InvalidLir(format!("{} has no body", func)))?;

            let mut callees: FxHashMap<FuncRef, FuncId> = FxHashMap::default();
            for block in &body.blocks {
                for instr in &block.instructions {
                    if let LirInstr::Call { callee, .. } = instr {
                        if !callees.contains_key(callee) {
                            let id = self.target_id(*callee, &pending_ids, &pending_links)?;
                            callees.insert(*callee, id);
                        }
                    }
                }
            }

            let id = pending_ids
                .get(&func)
                .copied()
                .ok_or_else(|| JitError::InvalidLir(format!("{} was not declared", func)))?;
            let mut ctx = self.module.make_context();
            ctx.func.signature = self.signature(entry.arity);
            ctx.func.name = UserFuncName::user(0, id.as_u32());

            let result = FunctionTranslator::new(&mut self.module, body, &callees)
                .translate(&mut ctx.func, &mut self.builder_ctx);
            if let Err(e) = result {
                // An abandoned builder leaves its context half-filled
                self.builder_ctx = FunctionBuilderContext::new();
                return Err(e);
            }
            translated.push((func, id, ctx));
        }

        for (func, id, mut ctx) in translated {
            self.module.define_function(id, &mut ctx)?;
            self.module.clear_context(&mut ctx);
            trace!(%func, "defined");
        }

        self.module.finalize_definitions()?;

        for (func, id) in pending_ids {
            let arity = image.get(func).map(|e| e.arity).unwrap_or(0);
            let ptr = self.module.get_finalized_function(id);
            self.func_ids.insert(func, id);
            self.code.insert(func, CompiledCode { ptr, arity });
        }
        for (func, link) in plan.links {
            self.links.insert(func, link);
        }
        debug!(
            compiled = plan.bodies.len(),
            total = self.code.len(),
            "batch finalized"
        );
        Ok(())
    }
}

/// Link a declaration by name: the most recent definition with the same
/// arity, then a host function, else unresolved
fn link_declaration(image: &ProgramImage, decl: FuncRef) -> Result<Link, JitError> {
    let entry = image
        .get(decl)
        .ok_or_else(|| JitError::InvalidLir(format!("{} is not in the image", decl)))?;

    let definition = image
        .iter()
        .filter(|(_, e)| {
            e.kind == EntryKind::Definition && e.name == entry.name && e.arity == entry.arity
        })
        .last()
        .map(|(func, _)| func);
    if let Some(func) = definition {
        return Ok(Link::Function(func));
    }

    if let Some((name, _)) = runtime::lookup_host(&entry.name, entry.arity) {
        return Ok(Link::Host(name));
    }

    Err(JitError::UnresolvedSymbol {
        name: entry.name.clone(),
        arity: entry.arity,
    })
}
