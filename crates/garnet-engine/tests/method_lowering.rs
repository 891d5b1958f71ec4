//! Method Lowering Tests
//!
//! Tests lowering of method definitions: entry arity checks, argument
//! binding, primitive-backed bodies, return routing and wrappers.
//! Run with: cargo test -p garnet-engine --test method_lowering

use std::sync::Arc;

use garnet_engine::ast::{ArgsNode, Expr, KeywordParam, MethodDefNode, RestParam};
use garnet_engine::ir::{ConstantLookup, Literal};
use garnet_engine::{
    CallShape, DefinitionId, ExecutableUnit, GuestError, LowerError, LowerOptions, Lowerer,
    MethodDefinition, Node, PrettyPrint, Source, SourceRange, UnitKind,
};

fn lowerer(text: &str, options: LowerOptions) -> Lowerer {
    Lowerer::new(Arc::new(Source::new("test.rb", text)), options).with_root_id(DefinitionId::root(1))
}

fn lower_method(def: MethodDefNode) -> MethodDefinition {
    lower_method_with(def, LowerOptions::default())
}

fn lower_method_with(def: MethodDefNode, options: LowerOptions) -> MethodDefinition {
    lowerer("", options)
        .lower_method_definition(&Arc::new(def))
        .expect("lowering failed")
}

fn unit_of(method: &MethodDefinition) -> Arc<ExecutableUnit> {
    method.unit().expect("method body failed to lower")
}

/// Statements inside the exception and return boundaries
fn entry_sequence(unit: &ExecutableUnit) -> &[Node] {
    let Node::TranslateExceptions { body, .. } = &unit.root else {
        panic!("expected exception translation, got {}", unit.root.kind_name());
    };
    let Node::CatchForMethod { body, .. } = body.as_ref() else {
        panic!("expected method return boundary, got {}", body.kind_name());
    };
    match body.as_ref() {
        Node::Sequence(nodes) => nodes,
        other => panic!("expected sequence, got {}", other.kind_name()),
    }
}

fn def(name: &str, args: ArgsNode, body: Expr) -> MethodDefNode {
    MethodDefNode::new(name, args, body, SourceRange::new(0, 0))
}

// =============================================================================
// STRUCTURE
// =============================================================================

mod structure {
    use super::*;

    #[test]
    fn test_method_unit_shape() {
        let method = lower_method(def("f", ArgsNode::required(["a"]), Expr::local("a")));
        let unit = unit_of(&method);

        assert_eq!(unit.kind, UnitKind::Method);
        assert_eq!(unit.name, "f");
        assert_eq!(method.definition_id.to_string(), "d1.0");
        assert_eq!(unit.return_id, method.definition_id);
        assert_eq!(unit.frame.slots, vec!["a"]);
        assert!(!unit.frame.needs_declaration_frame);

        let entry = entry_sequence(&unit);
        assert_eq!(entry.len(), 3);
        assert!(matches!(entry[0], Node::CheckArity(_)));
        assert!(matches!(entry[1], Node::Sequence(ref ops) if ops.len() == 1));
        assert!(matches!(entry[2], Node::ReadLocal(slot) if slot.depth == 0 && slot.index == 0));
    }

    #[test]
    fn test_return_boundary_matches_definition() {
        let method = lower_method(def("f", ArgsNode::new(), Expr::Return(Some(Box::new(Expr::Integer(3))))));
        let unit = unit_of(&method);

        let Node::TranslateExceptions { body, .. } = &unit.root else {
            panic!("missing exception translation");
        };
        let Node::CatchForMethod { return_id, .. } = body.as_ref() else {
            panic!("missing return boundary");
        };
        assert_eq!(*return_id, method.definition_id);

        let ret = unit
            .root
            .find(&|n| matches!(n, Node::Return { .. }))
            .expect("return not lowered");
        assert!(matches!(ret, Node::Return { return_id, .. } if *return_id == method.definition_id));
    }

    #[test]
    fn test_instrument_wraps_whole_unit() {
        let options = LowerOptions {
            instrument: true,
            ..LowerOptions::default()
        };
        let method = lower_method_with(def("f", ArgsNode::new(), Expr::Nil), options);
        let unit = unit_of(&method);
        assert!(matches!(&unit.root, Node::Instrument(inner)
            if matches!(inner.as_ref(), Node::TranslateExceptions { .. })));
    }

    #[test]
    fn test_pretty_print_mentions_method() {
        let method = lower_method(def("greet", ArgsNode::required(["name"]), Expr::local("name")));
        let output = unit_of(&method).pretty_print();
        assert!(output.starts_with("method greet d1.0"));
        assert!(output.contains("catch_for_method d1.0"));
        assert!(output.contains("check_arity arity(1/0/0)"));
    }

    #[test]
    fn test_source_range_extended_to_end() {
        let text = "def f(x)\n  x + 1\nend\n";
        let def = MethodDefNode::new(
            "f",
            ArgsNode::required(["x"]),
            Expr::local("x"),
            SourceRange::new(0, 1),
        );
        let method = lowerer(text, LowerOptions::default())
            .lower_method_definition(&Arc::new(def))
            .unwrap();

        assert_eq!(method.source_range, SourceRange::new(0, 2));
        assert_eq!(unit_of(&method).source_range, SourceRange::new(0, 2));
    }
}

// =============================================================================
// ARITY
// =============================================================================

mod arity {
    use super::*;

    #[test]
    fn test_optional_range() {
        let args = ArgsNode::required(["a"]).with_optional("b", Expr::Integer(1));
        let unit = unit_of(&lower_method(def("f", args, Expr::Nil)));

        assert!(unit.check_entry(&CallShape::positional(1)).is_ok());
        assert!(unit.check_entry(&CallShape::positional(2)).is_ok());
        assert_eq!(
            unit.check_entry(&CallShape::positional(0)),
            Err(GuestError::ArgumentCount {
                given: 0,
                expected: "1..2".into()
            })
        );
        assert!(unit.check_entry(&CallShape::positional(3)).is_err());
    }

    #[test]
    fn test_rest_is_unbounded() {
        let args = ArgsNode::required(["a"])
            .with_rest(RestParam::Named("rest".into()))
            .with_post("z");
        let unit = unit_of(&lower_method(def("f", args, Expr::Nil)));

        assert!(unit.check_entry(&CallShape::positional(1)).is_err());
        assert!(unit.check_entry(&CallShape::positional(2)).is_ok());
        assert!(unit.check_entry(&CallShape::positional(12)).is_ok());
    }

    #[test]
    fn test_required_keywords() {
        let args = ArgsNode::new()
            .with_keyword(KeywordParam::required("name"))
            .with_keyword(KeywordParam::optional("size", Expr::Integer(10)));
        let method = lower_method(def("f", args, Expr::Nil));
        let unit = unit_of(&method);

        assert_eq!(method.arity.keywords, vec!["name", "size"]);
        assert!(unit
            .check_entry(&CallShape::positional(0).with_keywords(["name"]))
            .is_ok());
        assert_eq!(
            unit.check_entry(&CallShape::positional(0).with_keywords(["size"])),
            Err(GuestError::MissingKeywords(vec!["name".into()]))
        );
        assert_eq!(
            unit.check_entry(&CallShape::positional(0).with_keywords(["name", "colour"])),
            Err(GuestError::UnknownKeywords(vec!["colour".into()]))
        );
    }

    #[test]
    fn test_unsupported_keyword_target_aborts() {
        let args = ArgsNode::new().with_keyword(KeywordParam {
            assignable: Expr::constant("K"),
        });
        let result = lowerer("", LowerOptions::default())
            .lower_method_definition(&Arc::new(def("f", args, Expr::Nil)));
        assert!(matches!(
            result,
            Err(LowerError::UnsupportedKeywordTarget { .. })
        ));
    }

    #[test]
    fn test_optional_default_is_lowered() {
        let args = ArgsNode::required(["a"]).with_optional("b", Expr::Integer(7));
        let unit = unit_of(&lower_method(def("f", args, Expr::Nil)));
        assert!(unit.root.contains(&|n| matches!(
            n,
            Node::ReadOptionalArgument { default, .. }
                if **default == Node::Literal(Literal::Integer(7))
        )));
    }
}

// =============================================================================
// PRIMITIVES
// =============================================================================

mod primitives {
    use super::*;

    fn marker(receiver: &str, method: &str, args: Vec<Expr>) -> Expr {
        Expr::call(Some(Expr::constant(receiver)), method, args)
    }

    #[test]
    fn test_primitive_body() {
        let body = Expr::statements(vec![
            marker("Primitive", "invoke", vec![Expr::symbol("integer_add")]),
            Expr::local("other"),
        ]);
        let unit = unit_of(&lower_method(def("+", ArgsNode::required(["other"]), body)));

        let entry = entry_sequence(&unit);
        assert_eq!(entry.len(), 2);
        assert!(matches!(entry[0], Node::CheckArity(_)));
        let Node::Primitive { name, fallback } = &entry[1] else {
            panic!("expected primitive, got {}", entry[1].kind_name());
        };
        assert_eq!(name, "integer_add");

        // Fallback binds arguments, then runs the remaining statements
        let Node::Sequence(fallback) = fallback.as_ref() else {
            panic!("expected fallback sequence");
        };
        assert!(matches!(&fallback[0], Node::Sequence(ops) if ops.len() == 1));
        assert!(matches!(fallback[1], Node::ReadLocal(_)));
    }

    #[test]
    fn test_marker_without_symbol_is_rejected() {
        let body = Expr::statements(vec![marker("Primitive", "invoke", vec![])]);
        let result = lowerer("", LowerOptions::default())
            .lower_method_definition(&Arc::new(def("f", ArgsNode::new(), body)));
        assert!(matches!(result, Err(LowerError::InvalidPrimitive { .. })));
    }

    #[test]
    fn test_other_receivers_are_ordinary_calls() {
        let body = Expr::statements(vec![marker("Kernel", "invoke", vec![Expr::symbol("x")])]);
        let unit = unit_of(&lower_method(def("f", ArgsNode::new(), body)));
        assert!(!unit.root.contains(&|n| matches!(n, Node::Primitive { .. })));
        assert!(unit.root.contains(&|n| matches!(n, Node::Call { name, .. } if name == "invoke")));
    }

    #[test]
    fn test_configured_marker() {
        let mut options = LowerOptions::default();
        options.primitive.receiver = "Truffle".into();
        options.primitive.method = "primitive".into();

        let body = Expr::statements(vec![marker("Truffle", "primitive", vec![Expr::symbol("nop")])]);
        let unit = unit_of(&lower_method_with(def("f", ArgsNode::new(), body), options));
        assert!(unit
            .root
            .contains(&|n| matches!(n, Node::Primitive { name, .. } if name == "nop")));
    }
}

// =============================================================================
// CONSTANTS AND SCOPES
// =============================================================================

mod scopes {
    use super::*;

    fn first_method(node: &Node) -> Arc<MethodDefinition> {
        match node.find(&|n| matches!(n, Node::MethodDefinition(_))) {
            Some(Node::MethodDefinition(method)) => Arc::clone(method),
            _ => panic!("no method definition"),
        }
    }

    #[test]
    fn test_constants_carry_lexical_path() {
        let program = Expr::Module {
            name: "Widgets".into(),
            body: Box::new(Expr::method_def(def("size", ArgsNode::new(), Expr::constant("Size")))),
        };
        let unit = lowerer("", LowerOptions::default())
            .lower_program(&program)
            .unwrap();

        let Node::ModuleDefinition { name, body } = &unit.root else {
            panic!("expected module definition");
        };
        assert_eq!(name, "Widgets");
        let method = unit_of(&first_method(&body.root));
        assert!(method.root.contains(&|n| matches!(
            n,
            Node::ReadConstant { name, lookup: ConstantLookup::Lexical(path) }
                if name == "Size" && *path == vec!["Object".to_string(), "Widgets".to_string()]
        )));
    }

    #[test]
    fn test_singleton_class_uses_dynamic_lookup() {
        let program = Expr::statements(vec![
            Expr::SingletonClass {
                receiver: Box::new(Expr::SelfRef),
                body: Box::new(Expr::method_def(def("x", ArgsNode::new(), Expr::constant("X")))),
            },
            Expr::constant("Y"),
        ]);
        let mut lowerer = lowerer("", LowerOptions::default());
        let unit = lowerer.lower_program(&program).unwrap();

        let Node::Sequence(statements) = &unit.root else {
            panic!("expected statements");
        };
        let Node::SingletonClassDefinition { body, .. } = &statements[0] else {
            panic!("expected singleton class");
        };
        let method = unit_of(&first_method(&body.root));
        assert!(method.root.contains(&|n| matches!(
            n,
            Node::ReadConstant { lookup: ConstantLookup::Dynamic, .. }
        )));

        // Lookup mode is restored after the body
        assert!(matches!(
            &statements[1],
            Node::ReadConstant { lookup: ConstantLookup::Lexical(_), .. }
        ));
        assert!(!lowerer.environment().is_dynamic_constant_lookup());
    }

    #[test]
    fn test_next_outside_block_is_rejected() {
        let result = lowerer("", LowerOptions::default())
            .lower_method_definition(&Arc::new(def("f", ArgsNode::new(), Expr::Next(None))));
        assert!(matches!(result, Err(LowerError::UnexpectedNode { .. })));
    }

    #[test]
    fn test_next_inside_loop_is_loop_next() {
        let body = Expr::While {
            cond: Box::new(Expr::True),
            body: Box::new(Expr::Next(None)),
        };
        let unit = unit_of(&lower_method(def("f", ArgsNode::new(), body)));
        assert!(unit.root.contains(&|n| matches!(n, Node::LoopNext)));
    }

    #[test]
    fn test_next_value_inside_loop_is_evaluated() {
        let value = Expr::call(None, "side_effect", vec![]);
        let body = Expr::While {
            cond: Box::new(Expr::True),
            body: Box::new(Expr::Next(Some(Box::new(value)))),
        };
        let unit = unit_of(&lower_method(def("f", ArgsNode::new(), body)));

        let Some(Node::While { body, .. }) = unit.root.find(&|n| matches!(n, Node::While { .. }))
        else {
            panic!("expected loop");
        };
        let Node::Sequence(parts) = body.as_ref() else {
            panic!("expected value then loop next, got {}", body.kind_name());
        };
        assert!(matches!(&parts[0], Node::Call { name, .. } if name == "side_effect"));
        assert_eq!(parts[1], Node::LoopNext);
    }
}
