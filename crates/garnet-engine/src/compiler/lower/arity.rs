//! Arity model
//!
//! The shape of a parameter list, derived once from the argument-list AST.
//! Used for the call-time arity check and to decide whether a block spreads
//! a lone array argument over its parameters.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::compiler::error::{GuestError, LowerError, LowerResult};
use crate::compiler::ir::CallShape;
use crate::parser::ast::ArgsNode;

/// Parameter list shape
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Arity {
    /// Required parameters before optionals
    pub pre: usize,
    /// Optional parameters
    pub optional: usize,
    /// Whether a rest parameter is present
    pub has_rest: bool,
    /// Required parameters after the rest parameter
    pub post: usize,
    /// Keyword names in declaration order; empty iff no keyword section
    pub keywords: Vec<String>,
    /// Keywords declared without a default
    pub required_keywords: Vec<String>,
    /// Whether a keyword rest parameter is present
    pub has_keyword_rest: bool,
}

impl Arity {
    /// Positional-only arity
    pub fn new(pre: usize, optional: usize, has_rest: bool, post: usize) -> Self {
        Self {
            pre,
            optional,
            has_rest,
            post,
            ..Self::default()
        }
    }

    /// `pre` required parameters and nothing else
    pub fn required(pre: usize) -> Self {
        Self::new(pre, 0, false, 0)
    }

    /// Derive the arity of a parameter list
    pub fn from_args(args: &ArgsNode) -> LowerResult<Self> {
        let mut keywords = Vec::with_capacity(args.keywords.len());
        let mut required_keywords = Vec::new();

        for keyword in &args.keywords {
            let (name, _) = keyword.target().ok_or_else(|| {
                LowerError::UnsupportedKeywordTarget {
                    parameter: format!("{:?}", keyword.assignable),
                }
            })?;
            keywords.push(name.to_string());
            if keyword.is_required() {
                required_keywords.push(name.to_string());
            }
        }

        Ok(Self {
            pre: args.pre.len(),
            optional: args.optional.len(),
            has_rest: args.has_rest(),
            post: args.post.len(),
            keywords,
            required_keywords,
            has_keyword_rest: args.keyword_rest.is_some(),
        })
    }

    /// Number of required positional parameters
    pub fn required_count(&self) -> usize {
        self.pre + self.post
    }

    /// Whether the list has a keyword section
    pub fn accepts_keywords(&self) -> bool {
        !self.keywords.is_empty() || self.has_keyword_rest
    }

    /// Same arity with the rest flag replaced
    pub fn with_rest(&self, has_rest: bool) -> Self {
        Self {
            has_rest,
            ..self.clone()
        }
    }

    /// Whether a lone array argument should be spread over the parameters
    pub fn should_destructure(&self) -> bool {
        should_destructure(self)
    }

    /// Expected positional count as reported in argument errors
    pub fn expected(&self) -> String {
        let min = self.required_count();
        if self.has_rest {
            format!("{}+", min)
        } else if self.optional > 0 {
            format!("{}..{}", min, min + self.optional)
        } else {
            min.to_string()
        }
    }

    /// Call-time check of a call shape against this arity
    pub fn check(&self, shape: &CallShape) -> Result<(), GuestError> {
        let accepts_keywords = self.accepts_keywords();

        // Keywords passed to a method without a keyword section arrive as a
        // trailing hash
        let given = if !accepts_keywords && !shape.keywords.is_empty() {
            shape.positional + 1
        } else {
            shape.positional
        };

        let min = self.required_count();
        let too_many = !self.has_rest && given > min + self.optional;
        if given < min || too_many {
            return Err(GuestError::ArgumentCount {
                given,
                expected: self.expected(),
            });
        }

        if !accepts_keywords {
            return Ok(());
        }

        let supplied: FxHashSet<&str> = shape.keywords.iter().map(String::as_str).collect();
        let missing: Vec<String> = self
            .required_keywords
            .iter()
            .filter(|name| !supplied.contains(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GuestError::MissingKeywords(missing));
        }

        if !self.has_keyword_rest {
            let declared: FxHashSet<&str> = self.keywords.iter().map(String::as_str).collect();
            let unknown: Vec<String> = shape
                .keywords
                .iter()
                .filter(|name| !declared.contains(name.as_str()))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(GuestError::UnknownKeywords(unknown));
            }
        }

        Ok(())
    }
}

/// Whether a block with this arity spreads a lone array argument
pub fn should_destructure(arity: &Arity) -> bool {
    if arity.has_keyword_rest {
        return true;
    }
    if !arity.has_rest && arity.optional == 0 && arity.pre + arity.post <= 1 {
        return false;
    }
    if arity.has_rest && arity.pre == 0 && arity.post == 0 {
        return false;
    }
    true
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arity({}/{}/{}", self.pre, self.optional, self.post)?;
        if self.has_rest {
            write!(f, " *")?;
        }
        if !self.keywords.is_empty() {
            let keywords: Vec<String> = self
                .keywords
                .iter()
                .map(|k| {
                    if self.required_keywords.contains(k) {
                        format!("{}:", k)
                    } else {
                        k.clone()
                    }
                })
                .collect();
            write!(f, " kw[{}]", keywords.join(", "))?;
        }
        if self.has_keyword_rest {
            write!(f, " **")?;
        }
        write!(f, ")")
    }
}
