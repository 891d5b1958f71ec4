//! Stock argument binder

use super::reload::reload_arguments;
use super::{ArgumentBinder, BindHost, BindMode, BoundArguments, ANONYMOUS_REST};
use crate::compiler::error::{LowerError, LowerResult};
use crate::compiler::ir::{ArgumentSource, MissingArgument, Node};
use crate::parser::ast::{ArgsNode, Expr, RestParam};

/// Binds parameters by writing each declared parameter's slot
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadArgumentsBinder;

impl LoadArgumentsBinder {
    pub fn new() -> Self {
        Self
    }
}

impl ArgumentBinder for LoadArgumentsBinder {
    fn bind(
        &self,
        args: &ArgsNode,
        mode: BindMode,
        host: &mut dyn BindHost,
    ) -> LowerResult<BoundArguments> {
        match mode {
            BindMode::Load { is_proc } => {
                let missing = if is_proc {
                    MissingArgument::Nil
                } else {
                    MissingArgument::Error
                };
                load_arguments(args, ArgumentSource::Call, missing, host)
            }
            BindMode::Destructure { array } => {
                load_arguments(args, ArgumentSource::Array(array), MissingArgument::Nil, host)
            }
            BindMode::Reload => reload_arguments(args, host),
        }
    }
}

fn load_arguments(
    args: &ArgsNode,
    source: ArgumentSource,
    missing: MissingArgument,
    host: &mut dyn BindHost,
) -> LowerResult<BoundArguments> {
    let pre = args.pre.len();
    let optional = args.optional.len();
    let post = args.post.len();
    let mut ops = Vec::new();

    for (index, name) in args.pre.iter().enumerate() {
        let slot = host.resolve_parameter(name)?;
        ops.push(Node::write_local(
            slot,
            Node::ReadPreArgument {
                source,
                index,
                missing,
            },
        ));
    }

    for (i, param) in args.optional.iter().enumerate() {
        let slot = host.resolve_parameter(&param.name)?;
        let default = host.lower_default(&param.default)?;
        ops.push(Node::write_local(
            slot,
            Node::ReadOptionalArgument {
                source,
                index: pre + i,
                min_count: pre + post + i + 1,
                default: default.boxed(),
            },
        ));
    }

    let rest_slot = match &args.rest {
        Some(RestParam::Named(name)) => Some(host.resolve_parameter(name)?),
        Some(RestParam::Anonymous { star: true }) => Some(host.resolve_parameter(ANONYMOUS_REST)?),
        Some(RestParam::Anonymous { star: false }) | None => None,
    };
    if let Some(slot) = rest_slot {
        ops.push(Node::write_local(
            slot,
            Node::ReadRestArguments {
                source,
                start: pre + optional,
                trailing: post,
                keywords_stripped: source == ArgumentSource::Call && args.has_keywords(),
            },
        ));
    }

    for (index, name) in args.post.iter().enumerate() {
        let slot = host.resolve_parameter(name)?;
        ops.push(Node::write_local(
            slot,
            Node::ReadPostArgument {
                source,
                index,
                pre,
                optional,
                post,
            },
        ));
    }

    let mut keyword_names = Vec::with_capacity(args.keywords.len());
    for keyword in &args.keywords {
        let (name, value) = keyword
            .target()
            .ok_or_else(|| LowerError::UnsupportedKeywordTarget {
                parameter: format!("{:?}", keyword.assignable),
            })?;
        let default = match value {
            Expr::RequiredKeywordValue => None,
            other => Some(host.lower_default(other)?.boxed()),
        };
        let slot = host.resolve_parameter(name)?;
        ops.push(Node::write_local(
            slot,
            Node::ReadKeywordArgument {
                name: name.to_string(),
                default,
            },
        ));
        keyword_names.push(name.to_string());
    }

    if let Some(name) = args.keyword_rest.as_ref().and_then(|k| k.name.as_deref()) {
        let slot = host.resolve_parameter(name)?;
        ops.push(Node::write_local(
            slot,
            Node::ReadKeywordRestArguments {
                excluded: keyword_names,
            },
        ));
    }

    if let Some(name) = &args.block {
        let slot = host.resolve_parameter(name)?;
        ops.push(Node::write_local(slot, Node::ReadBlockArgument));
    }

    Ok(BoundArguments {
        ops,
        rest_index: None,
    })
}
