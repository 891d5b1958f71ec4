//! Expression and statement lowering

use std::sync::Arc;

use super::arity::Arity;
use super::context::{ContextKind, LoweringContext};
use super::Lowerer;
use crate::compiler::error::{LowerError, LowerResult};
use crate::compiler::ir::{
    ConstantLookup, ExecutableUnit, Literal, Node, ProcType, SlotRef, UnitKind,
};
use crate::parser::ast::{BlockArg, CallNode, Expr};
use crate::parser::SourceRange;

impl Lowerer {
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> LowerResult<Node> {
        match expr {
            Expr::Nil => Ok(Node::Nil),
            Expr::True => Ok(Node::Literal(Literal::True)),
            Expr::False => Ok(Node::Literal(Literal::False)),
            Expr::SelfRef => Ok(Node::SelfValue),
            Expr::Integer(n) => Ok(Node::Literal(Literal::Integer(*n))),
            Expr::Str(s) => Ok(Node::Literal(Literal::Str(s.clone()))),
            Expr::Symbol(s) => Ok(Node::Literal(Literal::Symbol(s.clone()))),

            Expr::LocalVar(name) | Expr::DynVar(name) => Ok(self.lower_variable(name)),
            Expr::LocalAsgn { name, value } | Expr::DynAsgn { name, value } => {
                let value = self.lower_expr(value)?;
                let slot = match self.resolve_local(name) {
                    Some(slot) => slot,
                    None => SlotRef::local(self.current_ctx_mut().declare(name)),
                };
                Ok(Node::write_local(slot, value))
            }
            Expr::Const(name) => Ok(self.lower_constant(name)),

            Expr::Call(call) => self.lower_call(call),
            Expr::Lambda(block) => {
                let block = self.lower_block(block, ProcType::Lambda, None, None)?;
                Ok(Node::BlockDefinition(Arc::new(block)))
            }
            Expr::Splat(inner) => Ok(Node::Splat(self.lower_expr(inner)?.boxed())),

            Expr::Statements(statements) => {
                let nodes = statements
                    .iter()
                    .map(|s| self.lower_expr(s))
                    .collect::<LowerResult<Vec<_>>>()?;
                Ok(Node::sequence(nodes))
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_expr(cond)?;
                let then_branch = self.lower_expr(then_branch)?;
                let else_branch = match else_branch {
                    Some(e) => self.lower_expr(e)?,
                    None => Node::Nil,
                };
                Ok(Node::If {
                    cond: cond.boxed(),
                    then_branch: then_branch.boxed(),
                    else_branch: else_branch.boxed(),
                })
            }
            Expr::While { cond, body } => {
                self.current_ctx_mut().enter_loop();
                let cond = self.lower_expr(cond);
                let body = self.lower_expr(body);
                self.current_ctx_mut().exit_loop();
                Ok(Node::While {
                    cond: cond?.boxed(),
                    body: body?.boxed(),
                })
            }
            Expr::FlipFlop {
                begin,
                end,
                exclusive,
            } => {
                let cell = self.register_flip_flop_cell();
                Ok(Node::FlipFlop {
                    cell,
                    begin: self.lower_expr(begin)?.boxed(),
                    end: self.lower_expr(end)?.boxed(),
                    exclusive: *exclusive,
                })
            }

            Expr::Return(value) => self.lower_return(value.as_deref()),
            Expr::Next(value) => self.lower_next(value.as_deref()),
            Expr::Break(value) => self.lower_break(value.as_deref()),

            Expr::Super(node) => self.lower_super(node),
            Expr::ZSuper { block } => self.lower_zsuper(block.as_deref()),

            Expr::MethodDef(def) => {
                let method = self.lower_method_definition(def)?;
                Ok(Node::MethodDefinition(Arc::new(method)))
            }
            Expr::Module { name, body } => self.lower_module(name, body),
            Expr::SingletonClass { receiver, body } => self.lower_singleton_class(receiver, body),

            Expr::RequiredKeywordValue => Err(LowerError::unexpected(
                "required keyword value",
                "expression position",
            )),
        }
    }

    fn lower_value(&mut self, value: Option<&Expr>) -> LowerResult<Node> {
        match value {
            Some(expr) => self.lower_expr(expr),
            None => Ok(Node::Nil),
        }
    }

    /// Variable read; an undeclared name is a call on self
    fn lower_variable(&mut self, name: &str) -> Node {
        match self.resolve_local(name) {
            Some(slot) => Node::ReadLocal(slot),
            None => Node::Call {
                receiver: Node::SelfValue.boxed(),
                name: name.to_string(),
                args: Vec::new(),
                block: None,
            },
        }
    }

    fn lower_constant(&self, name: &str) -> Node {
        let lookup = if self.env.is_dynamic_constant_lookup() {
            ConstantLookup::Dynamic
        } else {
            ConstantLookup::Lexical(self.env.lexical_scope().path())
        };
        Node::ReadConstant {
            name: name.to_string(),
            lookup,
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn lower_call(&mut self, call: &CallNode) -> LowerResult<Node> {
        let receiver = match &call.receiver {
            Some(receiver) => self.lower_expr(receiver)?,
            None => Node::SelfValue,
        };
        let args = self.lower_arguments(&call.args)?;

        // A call with a block literal marks its frame live while it runs
        let marker = match call.block {
            Some(BlockArg::Literal(_)) => {
                Some(self.current_ctx_mut().allocate_temp("frame_on_stack"))
            }
            _ => None,
        };
        let block = self
            .lower_block_arg(call.block.as_ref(), Some(call.name.as_str()), marker)?
            .map(Node::boxed);

        let call = Node::Call {
            receiver: receiver.boxed(),
            name: call.name.clone(),
            args,
            block,
        };
        Ok(match marker {
            Some(marker) => Node::FrameOnStack {
                marker,
                call: call.boxed(),
            },
            None => call,
        })
    }

    pub(crate) fn lower_arguments(&mut self, args: &[Expr]) -> LowerResult<Vec<Node>> {
        args.iter().map(|arg| self.lower_expr(arg)).collect()
    }

    /// Block literal or block pass attached to a call or `super`
    pub(crate) fn lower_block_arg(
        &mut self,
        block: Option<&BlockArg>,
        attached_call: Option<&str>,
        frame_on_stack_marker: Option<u32>,
    ) -> LowerResult<Option<Node>> {
        match block {
            Some(BlockArg::Literal(block)) => {
                let block =
                    self.lower_block(block, ProcType::Proc, attached_call, frame_on_stack_marker)?;
                Ok(Some(Node::BlockDefinition(Arc::new(block))))
            }
            Some(BlockArg::Pass(expr)) => Ok(Some(Node::ToProc(self.lower_expr(expr)?.boxed()))),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Control signals
    // ========================================================================

    fn lower_return(&mut self, value: Option<&Expr>) -> LowerResult<Node> {
        let value = self.lower_value(value)?.boxed();
        let ctx = self.current_ctx();
        match ctx.kind {
            ContextKind::Method | ContextKind::TopLevel => Ok(Node::Return {
                return_id: ctx.definition.clone(),
                value,
            }),
            ContextKind::Block => {
                let lambda_id = ctx.definition.clone();
                let method_id = self
                    .enclosing_method()
                    .map(|id| self.ctx(id).definition.clone());
                Ok(Node::BlockReturn {
                    lambda_id,
                    method_id,
                    value,
                })
            }
            ContextKind::Module => Err(LowerError::unexpected("return", "module body")),
        }
    }

    fn lower_next(&mut self, value: Option<&Expr>) -> LowerResult<Node> {
        let value = self.lower_value(value)?;
        if self.current_ctx().in_loop() {
            // The loop discards the value; keep its evaluation
            return Ok(match value {
                Node::Nil => Node::LoopNext,
                value => Node::Sequence(vec![value, Node::LoopNext]),
            });
        }
        if self.current_ctx().is_block() {
            Ok(Node::Next(value.boxed()))
        } else {
            Err(LowerError::unexpected("next", context_name(self.current_ctx())))
        }
    }

    fn lower_break(&mut self, value: Option<&Expr>) -> LowerResult<Node> {
        let value = self.lower_value(value)?.boxed();
        let ctx = self.current_ctx();
        if ctx.in_loop() {
            Ok(Node::LoopBreak(value))
        } else if ctx.is_block() {
            Ok(Node::Break {
                break_id: ctx.definition.clone(),
                value,
            })
        } else {
            Err(LowerError::unexpected("break", context_name(ctx)))
        }
    }

    // ========================================================================
    // Module and singleton class bodies
    // ========================================================================

    fn lower_module(&mut self, name: &str, body: &Expr) -> LowerResult<Node> {
        let previous_scope = self.env.push_lexical_scope(name);
        let unit = self.lower_scope_body(name, body);
        self.env.reset_lexical_scope(previous_scope);

        Ok(Node::ModuleDefinition {
            name: name.to_string(),
            body: Arc::new(unit?),
        })
    }

    fn lower_singleton_class(&mut self, receiver: &Expr, body: &Expr) -> LowerResult<Node> {
        let receiver = self.lower_expr(receiver)?;

        let previous_lookup = self.env.is_dynamic_constant_lookup();
        self.env.set_dynamic_constant_lookup(true);
        let unit = self.lower_scope_body("singleton class", body);
        self.env.set_dynamic_constant_lookup(previous_lookup);

        Ok(Node::SingletonClassDefinition {
            receiver: receiver.boxed(),
            body: Arc::new(unit?),
        })
    }

    /// Module-like body in a fresh scope of its own
    fn lower_scope_body(&mut self, name: &str, body: &Expr) -> LowerResult<ExecutableUnit> {
        let definition = self.current_ctx_mut().next_child_id();
        let ctx = LoweringContext::new(ContextKind::Module, None, definition.clone());
        let previous = self.push_context(ctx);
        let scope = self.current;
        let root = self.lower_expr(body);
        self.current = previous;
        let root = self.with_flip_flop_init(scope, root?);

        log::debug!("[Lowering] module body {} ({})", name, definition);
        Ok(ExecutableUnit {
            name: name.to_string(),
            kind: UnitKind::Module,
            root,
            arity: Arity::default(),
            return_id: definition,
            frame: self.ctx(scope).frame_layout(),
            source_range: SourceRange::new(0, 0),
        })
    }
}

fn context_name(ctx: &LoweringContext) -> &'static str {
    match ctx.kind {
        ContextKind::TopLevel => "top level",
        ContextKind::Module => "module body",
        ContextKind::Method => "method body",
        ContextKind::Block => "block",
    }
}
