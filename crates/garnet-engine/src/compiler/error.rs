//! Lowering errors
//!
//! Two families live here. `LowerError` aborts lowering of a whole
//! definition; it means the AST handed over by the parser is malformed.
//! `GuestError` is never produced while lowering: it describes what the
//! guarded operations of a lowered unit raise when a call does not fit.

use thiserror::Error;

pub type LowerResult<T> = Result<T, LowerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("unsupported keyword arg {parameter}")]
    UnsupportedKeywordTarget { parameter: String },

    #[error("malformed primitive marker in {method}: {message}")]
    InvalidPrimitive { method: String, message: String },

    #[error("unexpected {node} in {context}")]
    UnexpectedNode { node: String, context: String },

    #[error("parameter {name} was used before being declared")]
    UndeclaredParameter { name: String },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl LowerError {
    pub(crate) fn unexpected(node: impl Into<String>, context: impl Into<String>) -> Self {
        LowerError::UnexpectedNode {
            node: node.into(),
            context: context.into(),
        }
    }
}

/// Errors raised at call time by lowered units
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuestError {
    #[error("wrong number of arguments (given {given}, expected {expected})")]
    ArgumentCount { given: usize, expected: String },

    #[error("missing keyword{}: {}", plural(.0), join_keywords(.0))]
    MissingKeywords(Vec<String>),

    #[error("unknown keyword{}: {}", plural(.0), join_keywords(.0))]
    UnknownKeywords(Vec<String>),

    #[error("{}", super_outside_message(.inside_define_method))]
    SuperOutsideMethod { inside_define_method: bool },

    #[error("TypeError: {message}")]
    TypeError { message: String },
}

fn plural(names: &[String]) -> &'static str {
    if names.len() == 1 {
        ""
    } else {
        "s"
    }
}

fn join_keywords(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!(":{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn super_outside_message(inside_define_method: &bool) -> &'static str {
    if *inside_define_method {
        "implicit argument passing of super from method defined by define_method() is not supported. Specify all arguments explicitly."
    } else {
        "super called outside of method"
    }
}
