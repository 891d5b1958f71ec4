//! Method lowering
//!
//! A method body is lowered by a `MethodJob` in a `Lowerer` of its own,
//! rooted at the method's context. Eager lowering runs the job at the
//! definition site; lazy lowering parks it in a `DeferredUnit` until the
//! method is first called.

use std::fmt;
use std::sync::Arc;

use super::arity::Arity;
use super::context::{ContextKind, LoweringContext};
use super::lazy::{DeferredUnit, LazySnapshot};
use super::Lowerer;
use crate::compiler::bind::{collect_parameters, ArgumentBinder, BindMode};
use crate::compiler::error::{LowerError, LowerResult};
use crate::compiler::ir::{
    DefinitionId, ExecutableUnit, MethodBody, MethodDefinition, Node, PrettyPrint, UnitKind,
    UnsupportedOperationBehavior,
};
use crate::compiler::options::LowerOptions;
use crate::parser::ast::{Expr, MethodDefNode};
use crate::parser::{extend_to_closing_line, ParseEnvironment, Source};

/// Everything needed to lower one method body
pub struct MethodJob {
    def: Arc<MethodDefNode>,
    definition: DefinitionId,
    snapshot: LazySnapshot,
    source: Arc<Source>,
    options: Arc<LowerOptions>,
    binder: Arc<dyn ArgumentBinder>,
}

impl MethodJob {
    pub fn definition_id(&self) -> &DefinitionId {
        &self.definition
    }

    /// Lower the body in the captured environment
    pub fn run(self) -> LowerResult<Arc<ExecutableUnit>> {
        let mut env = ParseEnvironment::new();
        self.snapshot.restore(&mut env);

        let mut root = LoweringContext::new(ContextKind::Method, None, self.definition.clone());
        root.method = Some(Arc::clone(&self.def));

        let mut lowerer = Lowerer::with_root(self.source, self.options, self.binder, env, root);
        let unit = lowerer.lower_method_body(&self.def, self.definition)?;

        log::debug!(
            "[Lowering] method {} {} ({} nodes)",
            unit.name,
            unit.return_id,
            unit.node_count()
        );
        log::trace!("[Lowering]\n{}", unit.pretty_print());
        Ok(Arc::new(unit))
    }
}

impl fmt::Debug for MethodJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodJob")
            .field("method", &self.def.name)
            .field("definition", &self.definition)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

impl Lowerer {
    /// Lower a method definition at the current point
    pub fn lower_method_definition(
        &mut self,
        def: &Arc<MethodDefNode>,
    ) -> LowerResult<MethodDefinition> {
        // Arity is needed before the body is lowered
        let arity = Arity::from_args(&def.args)?;
        let definition_id = self.current_ctx_mut().next_child_id();
        let source_range = extend_to_closing_line(def.range, &self.source);

        let job = MethodJob {
            def: Arc::clone(def),
            definition: definition_id.clone(),
            snapshot: LazySnapshot::capture(&self.env),
            source: Arc::clone(&self.source),
            options: Arc::clone(&self.options),
            binder: Arc::clone(&self.binder),
        };

        let body = if self.options.lazy_lowering {
            log::debug!("[Lowering] deferring method {} {}", def.name, definition_id);
            MethodBody::Deferred(Arc::new(DeferredUnit::new(job)))
        } else {
            MethodBody::Ready(job.run()?)
        };

        Ok(MethodDefinition {
            name: def.name.clone(),
            definition_id,
            arity,
            source_range,
            body,
        })
    }

    fn lower_method_body(
        &mut self,
        def: &MethodDefNode,
        definition: DefinitionId,
    ) -> LowerResult<ExecutableUnit> {
        let arity = Arity::from_args(&def.args)?;
        self.declare_all(collect_parameters(&def.args)?);

        let load = self
            .bind_arguments(&def.args, BindMode::Load { is_proc: false })?
            .into_sequence();

        let body = match self.primitive_marker(def)? {
            Some((primitive, rest)) => {
                let mut fallback = vec![load];
                for statement in rest {
                    fallback.push(self.lower_expr(statement)?);
                }
                // Arguments are bound on the fallback path only
                Node::Sequence(vec![
                    Node::CheckArity(arity.clone()),
                    Node::Primitive {
                        name: primitive,
                        fallback: Node::Sequence(fallback).boxed(),
                    },
                ])
            }
            None => {
                let body = self.lower_expr(&def.body)?;
                Node::Sequence(vec![Node::CheckArity(arity.clone()), load, body])
            }
        };

        let body = self.with_flip_flop_init(self.current, body);
        let body = Node::CatchForMethod {
            return_id: definition.clone(),
            body: body.boxed(),
        };
        let body = Node::TranslateExceptions {
            behavior: UnsupportedOperationBehavior::TypeError,
            body: body.boxed(),
        };
        let root = if self.options.instrument {
            Node::Instrument(body.boxed())
        } else {
            body
        };

        Ok(ExecutableUnit {
            name: def.name.clone(),
            kind: UnitKind::Method,
            root,
            arity,
            return_id: definition,
            frame: self.current_ctx().frame_layout(),
            source_range: extend_to_closing_line(def.range, &self.source),
        })
    }

    /// Primitive name and the statements after the marker, when the body
    /// starts with `Receiver.method :name`
    fn primitive_marker<'a>(
        &self,
        def: &'a MethodDefNode,
    ) -> LowerResult<Option<(String, &'a [Expr])>> {
        let Expr::Statements(statements) = &def.body else {
            return Ok(None);
        };
        let Some((Expr::Call(call), rest)) = statements.split_first() else {
            return Ok(None);
        };

        let marker = &self.options.primitive;
        let is_marker = call.name == marker.method
            && matches!(&call.receiver, Some(Expr::Const(name)) if *name == marker.receiver);
        if !is_marker {
            return Ok(None);
        }

        match call.args.first() {
            Some(Expr::Symbol(name)) => Ok(Some((name.clone(), rest))),
            _ => Err(LowerError::InvalidPrimitive {
                method: def.name.clone(),
                message: format!(
                    "{}.{} expects a symbol argument",
                    marker.receiver, marker.method
                ),
            }),
        }
    }
}
