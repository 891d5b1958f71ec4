//! Super Resolution Tests
//!
//! Tests explicit `super(args)` and bare `super`, including resolution of
//! the enclosing method's parameters from nested blocks.
//! Run with: cargo test -p garnet-engine --test super_resolution

use std::sync::Arc;

use garnet_engine::ast::{
    ArgsNode, BlockArg, BlockNode, Expr, KeywordParam, MethodDefNode, RestParam, SuperNode,
};
use garnet_engine::ir::SlotRef;
use garnet_engine::{
    BlockDefinition, CallShape, DefinitionId, ExecutableUnit, GuestError, LowerOptions, Lowerer,
    Node, Source, SourceRange,
};

fn block(args: ArgsNode, body: Expr) -> BlockNode {
    BlockNode::new(args, body, SourceRange::new(0, 0))
}

fn lowerer() -> Lowerer {
    Lowerer::new(Arc::new(Source::new("test.rb", "")), LowerOptions::default())
        .with_root_id(DefinitionId::root(1))
}

fn lower_method(args: ArgsNode, body: Expr) -> Arc<ExecutableUnit> {
    let def = MethodDefNode::new("initialize", args, body, SourceRange::new(0, 0));
    lowerer()
        .lower_method_definition(&Arc::new(def))
        .and_then(|method| method.unit())
        .expect("lowering failed")
}

fn find_super(node: &Node) -> &Node {
    node.find(&|n| matches!(n, Node::SuperCall { .. } | Node::SuperOutsideMethod { .. }))
        .expect("no super in tree")
}

fn find_block(node: &Node) -> Arc<BlockDefinition> {
    match node.find(&|n| matches!(n, Node::BlockDefinition(_))) {
        Some(Node::BlockDefinition(block)) => Arc::clone(block),
        _ => panic!("no block definition"),
    }
}

fn zsuper_reloads(node: &Node) -> (Option<usize>, &[Node]) {
    let Node::SuperCall { arguments, .. } = find_super(node) else {
        panic!("expected super call");
    };
    match arguments.as_ref() {
        Node::ReadZSuperArguments {
            rest_index,
            reloads,
        } => (*rest_index, reloads.as_slice()),
        other => panic!("expected zsuper arguments, got {}", other.kind_name()),
    }
}

// =============================================================================
// EXPLICIT SUPER
// =============================================================================

mod explicit {
    use super::*;

    fn explicit_super(args: Vec<Expr>, block: Option<BlockArg>) -> Expr {
        Expr::Super(Box::new(SuperNode { args, block }))
    }

    #[test]
    fn test_arguments_and_inherited_block() {
        let unit = lower_method(
            ArgsNode::required(["a"]),
            explicit_super(vec![Expr::local("a"), Expr::Integer(2)], None),
        );
        let Node::SuperCall {
            method_name,
            arguments,
            block,
        } = find_super(&unit.root)
        else {
            panic!("expected super call");
        };

        assert_eq!(method_name.as_deref(), Some("initialize"));
        assert!(matches!(arguments.as_ref(), Node::ReadSuperArguments { args, splatted: false }
            if args.len() == 2));
        assert_eq!(**block, Node::ReadInheritedBlock);
    }

    #[test]
    fn test_trailing_splat() {
        let args = ArgsNode::new().with_rest(RestParam::Named("args".into()));
        let unit = lower_method(
            args,
            explicit_super(vec![Expr::Splat(Box::new(Expr::local("args")))], None),
        );
        let Node::SuperCall { arguments, .. } = find_super(&unit.root) else {
            panic!("expected super call");
        };
        assert!(matches!(
            arguments.as_ref(),
            Node::ReadSuperArguments { splatted: true, .. }
        ));
    }

    #[test]
    fn test_block_pass() {
        let unit = lower_method(
            ArgsNode::new().with_block("blk"),
            explicit_super(vec![], Some(BlockArg::Pass(Expr::local("blk")))),
        );
        let Node::SuperCall { block, .. } = find_super(&unit.root) else {
            panic!("expected super call");
        };
        assert!(matches!(block.as_ref(), Node::ToProc(_)));
    }
}

// =============================================================================
// BARE SUPER
// =============================================================================

mod bare {
    use super::*;

    #[test]
    fn test_reloads_current_parameter_values() {
        let args = ArgsNode::required(["a"])
            .with_rest(RestParam::Named("rest".into()))
            .with_keyword(KeywordParam::required("k"));
        let unit = lower_method(args, Expr::zsuper());

        let (rest_index, reloads) = zsuper_reloads(&unit.root);
        assert_eq!(rest_index, Some(1));
        assert_eq!(reloads.len(), 3);
        assert_eq!(reloads[0], Node::ReadLocal(SlotRef::local(0)));
        assert_eq!(reloads[1], Node::ReadLocal(SlotRef::local(1)));
        assert!(matches!(&reloads[2], Node::KeywordHash { entries, rest: None }
            if entries.len() == 1 && entries[0].0 == "k"));
    }

    #[test]
    fn test_attached_block_replaces_inherited() {
        let zsuper = Expr::ZSuper {
            block: Some(Box::new(BlockArg::Literal(block(ArgsNode::new(), Expr::Nil)))),
        };
        let unit = lower_method(ArgsNode::new(), zsuper);
        let Node::SuperCall { block, .. } = find_super(&unit.root) else {
            panic!("expected super call");
        };
        assert!(matches!(block.as_ref(), Node::BlockDefinition(_)));
    }

    #[test]
    fn test_resolves_through_nested_blocks() {
        // def initialize(a, b)
        //   each { |x| map { |a| super } }
        // end
        let inner = block(ArgsNode::required(["a"]), Expr::zsuper());
        let outer = block(
            ArgsNode::required(["x"]),
            Expr::call_with_block("map", vec![], inner),
        );
        let unit = lower_method(
            ArgsNode::required(["a", "b"]),
            Expr::call_with_block("each", vec![], outer),
        );

        let outer = find_block(&unit.root);
        let inner = find_block(&outer.proc_unit.root);
        assert!(outer.needs_declaration_frame);
        assert!(inner.needs_declaration_frame);

        // Slots of the method, two frames out; the inner `a` is ignored
        let (rest_index, reloads) = zsuper_reloads(&inner.proc_unit.root);
        assert_eq!(rest_index, None);
        assert_eq!(
            reloads,
            &[
                Node::ReadLocal(SlotRef::new(2, 0)),
                Node::ReadLocal(SlotRef::new(2, 1)),
            ]
        );

        let Node::SuperCall { method_name, .. } = find_super(&inner.proc_unit.root) else {
            panic!("expected super call");
        };
        assert_eq!(method_name.as_deref(), Some("initialize"));
    }

    #[test]
    fn test_super_in_block_marks_frame() {
        let unit = lower_method(
            ArgsNode::new(),
            Expr::call_with_block("each", vec![], block(ArgsNode::new(), Expr::zsuper())),
        );
        assert!(find_block(&unit.root).needs_declaration_frame);
    }
}

// =============================================================================
// OUTSIDE A METHOD
// =============================================================================

mod outside_method {
    use super::*;

    #[test]
    fn test_top_level_super_fails_on_entry() {
        let unit = lowerer().lower_program(&Expr::zsuper()).unwrap();
        assert_eq!(
            unit.root,
            Node::SuperOutsideMethod {
                inside_define_method: false
            }
        );
        assert_eq!(
            unit.check_entry(&CallShape::positional(0)),
            Err(GuestError::SuperOutsideMethod {
                inside_define_method: false
            })
        );
    }

    #[test]
    fn test_block_at_top_level() {
        let program = Expr::call_with_block("each", vec![], block(ArgsNode::required(["x"]), Expr::zsuper()));
        let unit = lowerer().lower_program(&program).unwrap();
        let def = find_block(&unit.root);

        // Lowering succeeds; invocation fails
        let error = def
            .proc_unit
            .check_entry(&CallShape::positional(1))
            .unwrap_err();
        assert_eq!(error.to_string(), "super called outside of method");
    }

    #[test]
    fn test_define_method_block() {
        let program = Expr::call_with_block(
            "define_method",
            vec![Expr::symbol("greet")],
            block(ArgsNode::new(), Expr::zsuper()),
        );
        let unit = lowerer().lower_program(&program).unwrap();
        let def = find_block(&unit.root);

        assert_eq!(
            def.lambda_unit.check_entry(&CallShape::positional(0)),
            Err(GuestError::SuperOutsideMethod {
                inside_define_method: true
            })
        );
    }

    #[test]
    fn test_configured_dynamic_definition_name() {
        let options = LowerOptions {
            dynamic_method_definition: "define_singleton_method".into(),
            ..LowerOptions::default()
        };
        let program = Expr::call_with_block(
            "define_singleton_method",
            vec![Expr::symbol("greet")],
            block(ArgsNode::new(), Expr::zsuper()),
        );
        let unit = Lowerer::new(Arc::new(Source::new("test.rb", "")), options)
            .lower_program(&program)
            .unwrap();
        let def = find_block(&unit.root);
        assert!(def.proc_unit.root.contains(&|n| matches!(
            n,
            Node::SuperOutsideMethod {
                inside_define_method: true
            }
        )));
    }

    #[test]
    fn test_module_body() {
        let program = Expr::Module {
            name: "Mixin".into(),
            body: Box::new(Expr::zsuper()),
        };
        let unit = lowerer().lower_program(&program).unwrap();
        let Node::ModuleDefinition { body, .. } = &unit.root else {
            panic!("expected module definition");
        };
        assert!(matches!(body.root, Node::SuperOutsideMethod { .. }));
    }
}
