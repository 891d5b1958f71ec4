//! Pretty-printing for lowered units
//!
//! Provides a stable, indented text form used for debugging and logging.

use std::fmt::Write;

use super::node::{ArgumentSource, ConstantLookup, MissingArgument, Node};
use super::unit::{ExecutableUnit, MethodBody, ProcType};

/// Trait for pretty-printing lowered constructs
pub trait PrettyPrint {
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for ExecutableUnit {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        write_unit(&mut output, self, 0);
        output
    }
}

impl PrettyPrint for Node {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        write_node(&mut output, self, 0);
        output
    }
}

fn write_unit(output: &mut String, unit: &ExecutableUnit, indent: usize) {
    let prefix = " ".repeat(indent);
    writeln!(
        output,
        "{}{} {} {} {} lines {} {{",
        prefix,
        unit.kind.as_str(),
        unit.name,
        unit.return_id,
        unit.arity,
        unit.source_range
    )
    .unwrap();

    // Frame
    if !unit.frame.slots.is_empty() {
        writeln!(output, "{}  ; slots: {}", prefix, unit.frame.slots.join(", ")).unwrap();
    }
    if unit.frame.needs_declaration_frame {
        writeln!(output, "{}  ; needs declaration frame", prefix).unwrap();
    }

    write_node(output, &unit.root, indent + 2);
    writeln!(output, "{}}}", prefix).unwrap();
}

fn write_node(output: &mut String, node: &Node, indent: usize) {
    let prefix = " ".repeat(indent);
    let detail = node_detail(node);
    if detail.is_empty() {
        writeln!(output, "{}{}", prefix, node.kind_name()).unwrap();
    } else {
        writeln!(output, "{}{} {}", prefix, node.kind_name(), detail).unwrap();
    }

    match node {
        Node::BlockDefinition(block) => {
            write_unit(output, &block.proc_unit, indent + 2);
            write_unit(output, &block.lambda_unit, indent + 2);
        }
        Node::MethodDefinition(method) => match &method.body {
            MethodBody::Ready(unit) => write_unit(output, unit, indent + 2),
            MethodBody::Deferred(_) => {
                writeln!(output, "{}  ; deferred", prefix).unwrap();
            }
        },
        Node::ModuleDefinition { body, .. } => write_unit(output, body, indent + 2),
        Node::SingletonClassDefinition { receiver, body } => {
            write_node(output, receiver, indent + 2);
            write_unit(output, body, indent + 2);
        }
        _ => {
            for child in node.children() {
                write_node(output, child, indent + 2);
            }
        }
    }
}

fn source_detail(source: &ArgumentSource) -> String {
    match source {
        ArgumentSource::Call => "call".to_string(),
        ArgumentSource::Array(slot) => format!("array {}", slot),
    }
}

fn node_detail(node: &Node) -> String {
    match node {
        Node::Literal(lit) => lit.to_string(),
        Node::ReadLocal(slot) => slot.to_string(),
        Node::WriteLocal { slot, .. } => slot.to_string(),
        Node::ReadConstant { name, lookup } => match lookup {
            ConstantLookup::Lexical(path) => format!("{} in {}", name, path.join("::")),
            ConstantLookup::Dynamic => format!("{} dynamic", name),
        },
        Node::Call { name, .. } => name.clone(),
        Node::FrameOnStack { marker, .. } => format!("%{}", marker),
        Node::FlipFlop { cell, exclusive, .. } => {
            if *exclusive {
                format!("{} exclusive", cell)
            } else {
                cell.to_string()
            }
        }
        Node::InitFlipFlopCells(cells) => format!("{:?}", cells),
        Node::ReadPreArgument {
            source,
            index,
            missing,
        } => {
            let missing = match missing {
                MissingArgument::Nil => "nil",
                MissingArgument::Error => "error",
            };
            format!("{} from {} missing={}", index, source_detail(source), missing)
        }
        Node::ReadOptionalArgument {
            source,
            index,
            min_count,
            ..
        } => format!("{} from {} min={}", index, source_detail(source), min_count),
        Node::ReadRestArguments {
            source,
            start,
            trailing,
            keywords_stripped,
        } => {
            let mut detail = format!("{}..-{} from {}", start, trailing, source_detail(source));
            if *keywords_stripped {
                detail.push_str(" without keywords");
            }
            detail
        }
        Node::ReadPostArgument {
            source,
            index,
            pre,
            optional,
            post,
        } => format!(
            "{} of {} after {}+{} from {}",
            index,
            post,
            pre,
            optional,
            source_detail(source)
        ),
        Node::ReadKeywordArgument { name, default } => {
            if default.is_some() {
                name.clone()
            } else {
                format!("{} required", name)
            }
        }
        Node::ReadKeywordRestArguments { excluded } => {
            if excluded.is_empty() {
                String::new()
            } else {
                format!("except {}", excluded.join(", "))
            }
        }
        Node::KeywordHash { entries, rest } => {
            let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
            if rest.is_some() {
                format!("[{}] **", keys.join(", "))
            } else {
                format!("[{}]", keys.join(", "))
            }
        }
        Node::CheckArity(arity) => arity.to_string(),
        Node::Return { return_id, .. } => return_id.to_string(),
        Node::BlockReturn {
            lambda_id,
            method_id,
            ..
        } => match method_id {
            Some(method_id) => format!("lambda {} method {}", lambda_id, method_id),
            None => format!("lambda {}", lambda_id),
        },
        Node::Break { break_id, .. } => break_id.to_string(),
        Node::CatchForMethod { return_id, .. } | Node::CatchForLambda { return_id, .. } => {
            return_id.to_string()
        }
        Node::TranslateExceptions { behavior, .. } => format!("{:?}", behavior),
        Node::SuperCall { method_name, .. } => method_name.clone().unwrap_or_default(),
        Node::ReadSuperArguments { splatted, .. } => {
            if *splatted {
                "splatted".to_string()
            } else {
                String::new()
            }
        }
        Node::ReadZSuperArguments { rest_index, .. } => match rest_index {
            Some(index) => format!("rest at {}", index),
            None => String::new(),
        },
        Node::SuperOutsideMethod {
            inside_define_method,
        } => {
            if *inside_define_method {
                "inside define_method".to_string()
            } else {
                String::new()
            }
        }
        Node::Primitive { name, .. } => name.clone(),
        Node::BlockDefinition(block) => {
            let proc_type = match block.proc_type {
                ProcType::Proc => "proc",
                ProcType::Lambda => "lambda",
            };
            let mut detail = format!("{} {} {}", block.break_id, proc_type, block.arity);
            if let Some(marker) = block.frame_on_stack_marker {
                write!(detail, " marker %{}", marker).unwrap();
            }
            if block.needs_declaration_frame {
                detail.push_str(" needs declaration frame");
            }
            detail
        }
        Node::MethodDefinition(method) => {
            format!("{} {} {}", method.name, method.definition_id, method.arity)
        }
        Node::ModuleDefinition { name, .. } => name.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::ids::{DefinitionId, SlotRef};
    use crate::compiler::ir::node::Literal;
    use crate::compiler::ir::unit::{FrameLayout, UnitKind};
    use crate::compiler::lower::arity::Arity;
    use crate::parser::SourceRange;

    #[test]
    fn test_pretty_print_node() {
        let node = Node::Sequence(vec![
            Node::write_local(SlotRef::local(0), Node::Literal(Literal::Integer(1))),
            Node::ReadLocal(SlotRef::new(1, 2)),
        ]);
        let output = node.pretty_print();
        assert_eq!(
            output,
            "sequence\n  write_local %0\n    literal 1\n  read_local %2^1\n"
        );
    }

    #[test]
    fn test_pretty_print_unit() {
        let unit = ExecutableUnit {
            name: "f".to_string(),
            kind: UnitKind::Method,
            root: Node::Nil,
            arity: Arity::required(1),
            return_id: DefinitionId::root(3).child(0),
            frame: FrameLayout {
                slots: vec!["x".to_string()],
                needs_declaration_frame: false,
            },
            source_range: SourceRange::new(0, 2),
        };
        let output = unit.pretty_print();
        assert!(output.starts_with("method f d3.0 "));
        assert!(output.contains("; slots: x"));
        assert!(output.contains("  nil\n"));
        assert!(output.ends_with("}\n"));
    }
}
