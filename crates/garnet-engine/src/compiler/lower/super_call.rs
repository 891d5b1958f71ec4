//! `super` lowering
//!
//! Explicit `super(args)` lowers its arguments like any call. Bare `super`
//! forwards the current values of the enclosing method's parameters, which
//! may be several block frames out.

use std::sync::Arc;

use super::context::ContextKind;
use super::Lowerer;
use crate::compiler::bind::BindMode;
use crate::compiler::error::LowerResult;
use crate::compiler::ir::Node;
use crate::parser::ast::{BlockArg, Expr, SuperNode};

const SUPER: &str = "super";

impl Lowerer {
    pub(crate) fn lower_super(&mut self, node: &SuperNode) -> LowerResult<Node> {
        let args = self.lower_arguments(&node.args)?;
        let splatted = matches!(node.args.last(), Some(Expr::Splat(_)));
        let block = self
            .lower_block_arg(node.block.as_ref(), Some(SUPER), None)?
            .unwrap_or(Node::ReadInheritedBlock);

        Ok(Node::SuperCall {
            method_name: self.enclosing_method_name(),
            arguments: Node::ReadSuperArguments { args, splatted }.boxed(),
            block: block.boxed(),
        })
    }

    pub(crate) fn lower_zsuper(&mut self, block: Option<&BlockArg>) -> LowerResult<Node> {
        if self.current_ctx().is_block() {
            self.current_ctx_mut().needs_declaration_frame = true;
        }
        let block = self.lower_block_arg(block, Some(SUPER), None)?;

        // Walk out through blocks to the method
        let mut id = self.current;
        let mut depth = 0;
        let mut inside_define_method = false;
        loop {
            let ctx = self.ctx(id);
            if !ctx.is_block() {
                break;
            }
            if ctx.attached_call.as_deref() == Some(self.options.dynamic_method_definition.as_str())
            {
                inside_define_method = true;
            }
            match ctx.parent {
                Some(parent) => {
                    id = parent;
                    depth += 1;
                }
                None => break,
            }
        }

        let method = self.ctx(id);
        let def = match (&method.kind, &method.method) {
            (ContextKind::Method, Some(def)) => Arc::clone(def),
            _ => {
                log::trace!(
                    "[Lowering] bare super outside method (define_method: {})",
                    inside_define_method
                );
                return Ok(Node::SuperOutsideMethod {
                    inside_define_method,
                });
            }
        };

        self.mark_declaration_frames(self.current, depth);
        let reload = self.bind_arguments_in(&def.args, BindMode::Reload, id, depth)?;

        Ok(Node::SuperCall {
            method_name: Some(def.name.clone()),
            arguments: Node::ReadZSuperArguments {
                rest_index: reload.rest_index,
                reloads: reload.ops,
            }
            .boxed(),
            block: block.unwrap_or(Node::ReadInheritedBlock).boxed(),
        })
    }

    fn enclosing_method_name(&self) -> Option<String> {
        self.enclosing_method()
            .and_then(|id| self.ctx(id).method.as_ref())
            .map(|def| def.name.clone())
    }
}
