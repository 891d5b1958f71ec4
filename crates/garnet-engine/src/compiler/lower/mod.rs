//! AST to executable unit lowering
//!
//! Converts method, block and program ASTs into executable units. A
//! `Lowerer` owns the context arena for one lowering entry point; method
//! bodies get a `Lowerer` of their own (see `method`), which is what lets a
//! deferred body be lowered later with the same result.

pub mod arity;
pub mod block;
pub mod context;
mod expr;
pub mod flip_flop;
pub mod lazy;
pub mod method;
pub mod super_call;

use std::sync::Arc;

use crate::compiler::bind::{ArgumentBinder, BindHost, BindMode, BoundArguments, LoadArgumentsBinder};
use crate::compiler::error::{LowerError, LowerResult};
use crate::compiler::ir::{DefinitionId, ExecutableUnit, Node, PrettyPrint, SlotRef, UnitKind};
use crate::compiler::options::LowerOptions;
use crate::parser::ast::{ArgsNode, Expr};
use crate::parser::{ParseEnvironment, Source, SourceRange};

use arity::Arity;
use context::{ContextId, ContextKind, LoweringContext};

pub use lazy::{DeferredUnit, LazySnapshot};

/// Name of the unit produced for a program
pub const MAIN_UNIT: &str = "<main>";

/// Lowers ASTs of one source into executable units
pub struct Lowerer {
    /// Source the ASTs were parsed from
    source: Arc<Source>,
    options: Arc<LowerOptions>,
    binder: Arc<dyn ArgumentBinder>,
    /// Lexical scope and constant lookup mode at the current point
    env: ParseEnvironment,
    contexts: Vec<LoweringContext>,
    current: ContextId,
}

impl Lowerer {
    /// Create a lowerer positioned at the top level of `source`
    pub fn new(source: Arc<Source>, options: LowerOptions) -> Self {
        Self::with_root(
            source,
            Arc::new(options),
            Arc::new(LoadArgumentsBinder::new()),
            ParseEnvironment::new(),
            LoweringContext::new(ContextKind::TopLevel, None, DefinitionId::fresh_root()),
        )
    }

    fn with_root(
        source: Arc<Source>,
        options: Arc<LowerOptions>,
        binder: Arc<dyn ArgumentBinder>,
        env: ParseEnvironment,
        root: LoweringContext,
    ) -> Self {
        Self {
            source,
            options,
            binder,
            env,
            contexts: vec![root],
            current: ContextId(0),
        }
    }

    /// Use a different argument binder
    pub fn with_binder(mut self, binder: Arc<dyn ArgumentBinder>) -> Self {
        self.binder = binder;
        self
    }

    /// Pin the id of the top-level definition
    pub fn with_root_id(mut self, id: DefinitionId) -> Self {
        self.contexts[0].definition = id;
        self
    }

    /// Start from an existing parse environment
    pub fn with_environment(mut self, env: ParseEnvironment) -> Self {
        self.env = env;
        self
    }

    pub fn options(&self) -> &LowerOptions {
        &self.options
    }

    pub fn environment(&self) -> &ParseEnvironment {
        &self.env
    }

    /// Lower a whole program into the top-level unit
    pub fn lower_program(&mut self, program: &Expr) -> LowerResult<ExecutableUnit> {
        let root = ContextId(0);
        let previous = std::mem::replace(&mut self.current, root);
        let body = self.lower_expr(program);
        self.current = previous;
        let body = self.with_flip_flop_init(root, body?);

        let ctx = self.ctx(root);
        let last_line = self.source.line_count().saturating_sub(1);
        let unit = ExecutableUnit {
            name: MAIN_UNIT.to_string(),
            kind: UnitKind::TopLevel,
            root: body,
            arity: Arity::default(),
            return_id: ctx.definition.clone(),
            frame: ctx.frame_layout(),
            source_range: SourceRange::new(0, last_line),
        };

        log::debug!(
            "[Lowering] program {} ({} nodes)",
            self.source.name(),
            unit.node_count()
        );
        log::trace!("[Lowering]\n{}", unit.pretty_print());
        Ok(unit)
    }

    // ========================================================================
    // Context arena
    // ========================================================================

    fn ctx(&self, id: ContextId) -> &LoweringContext {
        &self.contexts[id.index()]
    }

    fn ctx_mut(&mut self, id: ContextId) -> &mut LoweringContext {
        &mut self.contexts[id.index()]
    }

    fn current_ctx(&self) -> &LoweringContext {
        self.ctx(self.current)
    }

    fn current_ctx_mut(&mut self) -> &mut LoweringContext {
        let current = self.current;
        self.ctx_mut(current)
    }

    /// Make `ctx` current, returning the context to restore afterwards
    fn push_context(&mut self, ctx: LoweringContext) -> ContextId {
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(ctx);
        std::mem::replace(&mut self.current, id)
    }

    /// Nearest method context, looking through blocks
    fn enclosing_method(&self) -> Option<ContextId> {
        let mut id = self.current;
        loop {
            let ctx = self.ctx(id);
            match ctx.kind {
                ContextKind::Method => return Some(id),
                ContextKind::Block => id = ctx.parent?,
                ContextKind::TopLevel | ContextKind::Module => return None,
            }
        }
    }

    /// Mark `frames` contexts, starting at `from` and walking up, as reading
    /// their declaration frame
    fn mark_declaration_frames(&mut self, from: ContextId, frames: u32) {
        let mut id = Some(from);
        for _ in 0..frames {
            let Some(current) = id else { break };
            let ctx = self.ctx_mut(current);
            ctx.needs_declaration_frame = true;
            id = ctx.parent;
        }
    }

    // ========================================================================
    // Locals
    // ========================================================================

    /// Resolve a local from the current context, looking through blocks
    fn resolve_local(&mut self, name: &str) -> Option<SlotRef> {
        let mut id = self.current;
        let mut depth = 0;
        loop {
            let ctx = self.ctx(id);
            if let Some(index) = ctx.lookup(name) {
                self.mark_declaration_frames(self.current, depth);
                return Some(SlotRef::new(depth, index));
            }
            if !ctx.is_block() {
                return None;
            }
            id = ctx.parent?;
            depth += 1;
        }
    }

    /// Declare every name in the current context
    fn declare_all<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ctx = self.current_ctx_mut();
        for name in names {
            ctx.declare(name.as_ref());
        }
    }

    // ========================================================================
    // Argument binding
    // ========================================================================

    /// Bind `args` in the current context
    fn bind_arguments(&mut self, args: &ArgsNode, mode: BindMode) -> LowerResult<BoundArguments> {
        let target = self.current;
        self.bind_arguments_in(args, mode, target, 0)
    }

    /// Bind `args` whose slots live in `target`, `depth` frames out
    fn bind_arguments_in(
        &mut self,
        args: &ArgsNode,
        mode: BindMode,
        target: ContextId,
        depth: u32,
    ) -> LowerResult<BoundArguments> {
        let binder = Arc::clone(&self.binder);
        let mut host = ParameterHost {
            lowerer: self,
            target,
            depth,
        };
        binder.bind(args, mode, &mut host)
    }
}

/// Binder services backed by a lowering context
struct ParameterHost<'a> {
    lowerer: &'a mut Lowerer,
    target: ContextId,
    depth: u32,
}

impl BindHost for ParameterHost<'_> {
    fn resolve_parameter(&mut self, name: &str) -> LowerResult<SlotRef> {
        self.lowerer
            .ctx(self.target)
            .lookup(name)
            .map(|index| SlotRef::new(self.depth, index))
            .ok_or_else(|| LowerError::UndeclaredParameter {
                name: name.to_string(),
            })
    }

    fn lower_default(&mut self, expr: &Expr) -> LowerResult<Node> {
        self.lowerer.lower_expr(expr)
    }
}
