//! Reload mode: arguments for bare `super`
//!
//! Every parameter is re-read from its slot, so reassignments made since
//! entry are forwarded. Keywords travel as one trailing hash.

use super::{BindHost, BoundArguments, ANONYMOUS_REST};
use crate::compiler::error::{LowerError, LowerResult};
use crate::compiler::ir::Node;
use crate::parser::ast::{ArgsNode, RestParam};

pub(crate) fn reload_arguments(
    args: &ArgsNode,
    host: &mut dyn BindHost,
) -> LowerResult<BoundArguments> {
    let mut ops = Vec::new();
    let mut rest_index = None;

    for name in args.pre.iter().chain(args.optional.iter().map(|p| &p.name)) {
        ops.push(Node::ReadLocal(host.resolve_parameter(name)?));
    }

    let rest_name = match &args.rest {
        Some(RestParam::Named(name)) => Some(name.as_str()),
        Some(RestParam::Anonymous { star: true }) => Some(ANONYMOUS_REST),
        Some(RestParam::Anonymous { star: false }) | None => None,
    };
    if let Some(name) = rest_name {
        rest_index = Some(ops.len());
        ops.push(Node::ReadLocal(host.resolve_parameter(name)?));
    }

    for name in &args.post {
        ops.push(Node::ReadLocal(host.resolve_parameter(name)?));
    }

    let mut entries = Vec::with_capacity(args.keywords.len());
    for keyword in &args.keywords {
        let (name, _) = keyword
            .target()
            .ok_or_else(|| LowerError::UnsupportedKeywordTarget {
                parameter: format!("{:?}", keyword.assignable),
            })?;
        entries.push((name.to_string(), Node::ReadLocal(host.resolve_parameter(name)?)));
    }

    let keyword_rest = match args.keyword_rest.as_ref().and_then(|k| k.name.as_deref()) {
        Some(name) => Some(Node::ReadLocal(host.resolve_parameter(name)?).boxed()),
        None => None,
    };

    if !entries.is_empty() || keyword_rest.is_some() {
        ops.push(Node::KeywordHash {
            entries,
            rest: keyword_rest,
        });
    }

    Ok(BoundArguments { ops, rest_index })
}
