//! Parameter collection

use super::ANONYMOUS_REST;
use crate::compiler::error::{LowerError, LowerResult};
use crate::parser::ast::{ArgsNode, RestParam};

/// Names a parameter list declares, in slot order.
///
/// Order: pre, optional, rest, post, keywords, keyword rest, block. An
/// anonymous `*` is declared under [`ANONYMOUS_REST`]; the implicit rest of
/// `|a,|` declares nothing.
pub fn collect_parameters(args: &ArgsNode) -> LowerResult<Vec<String>> {
    let mut names = Vec::new();

    names.extend(args.pre.iter().cloned());
    names.extend(args.optional.iter().map(|p| p.name.clone()));

    match &args.rest {
        Some(RestParam::Named(name)) => names.push(name.clone()),
        Some(RestParam::Anonymous { star: true }) => names.push(ANONYMOUS_REST.to_string()),
        Some(RestParam::Anonymous { star: false }) | None => {}
    }

    names.extend(args.post.iter().cloned());

    for keyword in &args.keywords {
        let (name, _) = keyword
            .target()
            .ok_or_else(|| LowerError::UnsupportedKeywordTarget {
                parameter: format!("{:?}", keyword.assignable),
            })?;
        names.push(name.to_string());
    }

    if let Some(name) = args.keyword_rest.as_ref().and_then(|k| k.name.clone()) {
        names.push(name);
    }
    if let Some(name) = &args.block {
        names.push(name.clone());
    }

    Ok(names)
}
