//! Entry pre-check for lowered units
//!
//! Walks the straight-line prefix of a unit and reports the guest error a
//! call of a given shape raises there. Anything that branches or dispatches
//! ends the walk.

use super::node::Node;
use super::unit::ExecutableUnit;
use crate::compiler::error::GuestError;

/// Shape of an incoming call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallShape {
    /// Number of positional arguments
    pub positional: usize,
    /// Keyword argument names, in call order
    pub keywords: Vec<String>,
}

impl CallShape {
    /// Call with positional arguments only
    pub fn positional(count: usize) -> Self {
        Self {
            positional: count,
            keywords: Vec::new(),
        }
    }

    /// Add keyword arguments
    pub fn with_keywords<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(names.into_iter().map(Into::into));
        self
    }
}

enum Probe {
    Continue,
    Stop,
}

impl ExecutableUnit {
    /// First guest error raised on entry by a call of `shape`
    pub fn check_entry(&self, shape: &CallShape) -> Result<(), GuestError> {
        probe(&self.root, shape).map(|_| ())
    }
}

fn probe(node: &Node, shape: &CallShape) -> Result<Probe, GuestError> {
    match node {
        Node::Sequence(nodes) => {
            for node in nodes {
                if let Probe::Stop = probe(node, shape)? {
                    return Ok(Probe::Stop);
                }
            }
            Ok(Probe::Continue)
        }
        Node::Shared(inner) => probe(inner, shape),
        Node::CatchForMethod { body, .. }
        | Node::CatchForLambda { body, .. }
        | Node::TranslateExceptions { body, .. } => probe(body, shape),
        Node::CatchForProc(body) | Node::Instrument(body) => probe(body, shape),
        Node::WriteLocal { value, .. } => probe(value, shape),
        Node::CheckArity(arity) => arity.check(shape).map(|_| Probe::Continue),
        Node::SuperOutsideMethod {
            inside_define_method,
        } => Err(GuestError::SuperOutsideMethod {
            inside_define_method: *inside_define_method,
        }),
        Node::Nil
        | Node::Literal(_)
        | Node::SelfValue
        | Node::ReadLocal(_)
        | Node::InitFlipFlopCells(_)
        | Node::ReadPreArgument { .. }
        | Node::ReadRestArguments { .. }
        | Node::ReadPostArgument { .. }
        | Node::ReadKeywordRestArguments { .. }
        | Node::ReadBlockArgument
        | Node::BlockDefinition(_)
        | Node::MethodDefinition(_) => Ok(Probe::Continue),
        _ => Ok(Probe::Stop),
    }
}
