//! Block lowering
//!
//! A block is lowered once and packaged twice. The proc unit binds
//! leniently: missing arguments are nil and a lone array argument is
//! spread over the parameters when the arity calls for it. The lambda unit
//! checks arity on entry and catches `return` locally. Both units refer to
//! the same lowered body.

use std::sync::Arc;

use super::arity::Arity;
use super::context::{ContextKind, LoweringContext};
use super::Lowerer;
use crate::compiler::bind::{collect_parameters, BindMode};
use crate::compiler::error::LowerResult;
use crate::compiler::ir::{
    ArgumentSource, BlockDefinition, DefinitionId, ExecutableUnit, MissingArgument, Node,
    PrettyPrint, ProcType, SlotRef, UnitKind,
};
use crate::parser::ast::BlockNode;
use crate::parser::extend_to_closing_line;

impl Lowerer {
    /// Lower a block literal attached to `attached_call`.
    ///
    /// `frame_on_stack_marker` is the slot, in the current frame, where the
    /// attached call publishes its live-frame marker.
    pub fn lower_block(
        &mut self,
        block: &BlockNode,
        proc_type: ProcType,
        attached_call: Option<&str>,
        frame_on_stack_marker: Option<u32>,
    ) -> LowerResult<BlockDefinition> {
        let definition = self.current_ctx_mut().next_child_id();
        let mut ctx = LoweringContext::new(ContextKind::Block, Some(self.current), definition.clone());
        ctx.attached_call = attached_call.map(str::to_string);

        let previous = self.push_context(ctx);
        let result = self.lower_block_body(block, proc_type, definition);
        self.current = previous;
        Ok(BlockDefinition {
            frame_on_stack_marker,
            ..result?
        })
    }

    fn lower_block_body(
        &mut self,
        block: &BlockNode,
        proc_type: ProcType,
        definition: DefinitionId,
    ) -> LowerResult<BlockDefinition> {
        let arity = Arity::from_args(&block.args)?;
        // `|a,|` takes exactly one argument as a lambda
        let arity_for_check = if block.args.has_trailing_comma_rest() {
            arity.with_rest(false)
        } else {
            arity.clone()
        };

        self.declare_all(collect_parameters(&block.args)?);

        let load = self.bind_arguments(
            &block.args,
            BindMode::Load {
                is_proc: proc_type == ProcType::Proc,
            },
        )?;

        let proc_prelude = if arity.should_destructure() {
            let array = SlotRef::local(self.current_ctx_mut().allocate_temp("destructure"));
            let destructure = self.bind_arguments(&block.args, BindMode::Destructure { array })?;
            destructure_prelude(array, destructure.into_sequence(), load.clone().into_sequence())
        } else {
            load.clone().into_sequence()
        };
        let lambda_prelude = Node::Sequence(vec![
            Node::CheckArity(arity_for_check),
            load.into_sequence(),
        ]);

        if !block.for_statement {
            self.declare_all(&block.locals);
        }

        let body = self.lower_expr(&block.body)?;
        let body = if self.options.instrument {
            Node::Instrument(body.boxed())
        } else {
            body
        };
        let body = Arc::new(body);

        // Flip-flop cells of a block always live in an enclosing frame
        let compose =
            |prelude: Node| Node::Sequence(vec![prelude, Node::Shared(Arc::clone(&body))]);
        let proc_root = Node::CatchForProc(compose(proc_prelude).boxed());
        let lambda_root = Node::CatchForLambda {
            return_id: definition.clone(),
            body: compose(lambda_prelude).boxed(),
        };

        let ctx = self.current_ctx();
        let name = self.block_name();
        let frame = ctx.frame_layout();
        let needs_declaration_frame = ctx.needs_declaration_frame;
        let source_range = extend_to_closing_line(block.range, &self.source);

        let unit = |kind: UnitKind, root: Node| {
            Arc::new(ExecutableUnit {
                name: name.clone(),
                kind,
                root,
                arity: arity.clone(),
                return_id: definition.clone(),
                frame: frame.clone(),
                source_range,
            })
        };
        let proc_unit = unit(UnitKind::Proc, proc_root);
        let lambda_unit = unit(UnitKind::Lambda, lambda_root);

        log::debug!(
            "[Lowering] {} {} {:?} ({} nodes)",
            name,
            definition,
            proc_type,
            body.node_count()
        );
        log::trace!("[Lowering]\n{}", lambda_unit.pretty_print());

        Ok(BlockDefinition {
            proc_type,
            proc_unit,
            lambda_unit,
            arity,
            break_id: definition,
            frame_on_stack_marker: None,
            needs_declaration_frame,
            source_range,
        })
    }

    /// `block in <method>` for backtraces
    fn block_name(&self) -> String {
        let owner = self
            .enclosing_method()
            .and_then(|id| self.ctx(id).method.as_ref())
            .map(|def| def.name.as_str())
            .unwrap_or(super::MAIN_UNIT);
        format!("block in {}", owner)
    }
}

/// Spread a lone array argument when it converts, otherwise bind normally
fn destructure_prelude(array: SlotRef, destructure: Node, load: Node) -> Node {
    let first_argument = || Node::ReadPreArgument {
        source: ArgumentSource::Call,
        index: 0,
        missing: MissingArgument::Error,
    };

    let cond = Node::And(
        Node::ShouldDestructure(first_argument().boxed()).boxed(),
        Node::Sequence(vec![
            Node::write_local(array, Node::ArrayCast(first_argument().boxed())),
            Node::Not(Node::IsNil(Node::ReadLocal(array).boxed()).boxed()),
        ])
        .boxed(),
    );

    Node::If {
        cond: cond.boxed(),
        then_branch: destructure.boxed(),
        else_branch: load.boxed(),
    }
}
