//! Abstract Syntax Tree consumed by the lowering pass.
//!
//! This is the closed set of node variants the parser hands over:
//! - Definitions (methods, blocks, lambdas, module and singleton class bodies)
//! - Argument lists with required, optional, rest, post, keyword,
//!   keyword-rest and block parameters
//! - Calls, constant references, local and dynamic variables
//! - Explicit and bare `super`
//! - The handful of statements and literals a body is made of
//!
//! Method definitions are reference counted so a deferred lowering job can
//! keep its definition alive without copying the tree.

use std::sync::Arc;

use crate::parser::source::SourceRange;

/// An expression or statement
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `nil`
    Nil,
    /// `true`
    True,
    /// `false`
    False,
    /// `self`
    SelfRef,
    /// Integer literal
    Integer(i64),
    /// String literal
    Str(String),
    /// Symbol literal (`:name`)
    Symbol(String),

    /// Read of a method-level local variable
    LocalVar(String),
    /// Read of a block-level (dynamic) variable
    DynVar(String),
    /// Assignment to a method-level local variable
    LocalAsgn { name: String, value: Box<Expr> },
    /// Assignment to a block-level (dynamic) variable
    DynAsgn { name: String, value: Box<Expr> },
    /// Constant reference
    Const(String),

    /// Method call, optionally with a block
    Call(Box<CallNode>),
    /// Lambda literal (`-> (a) { ... }`)
    Lambda(Box<BlockNode>),
    /// Splatted argument (`*list`)
    Splat(Box<Expr>),

    /// Statement list
    Statements(Vec<Expr>),
    /// Conditional
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// `while` loop
    While { cond: Box<Expr>, body: Box<Expr> },
    /// Range used as a boolean condition (`if a..b`)
    FlipFlop {
        begin: Box<Expr>,
        end: Box<Expr>,
        exclusive: bool,
    },
    /// `return`
    Return(Option<Box<Expr>>),
    /// `next`
    Next(Option<Box<Expr>>),
    /// `break`
    Break(Option<Box<Expr>>),

    /// `super(args)`
    Super(Box<SuperNode>),
    /// Bare `super`, forwarding the enclosing method's arguments
    ZSuper { block: Option<Box<BlockArg>> },

    /// `def name(args) ... end`
    MethodDef(Arc<MethodDefNode>),
    /// `module Name ... end`
    Module { name: String, body: Box<Expr> },
    /// `class << receiver ... end`
    SingletonClass {
        receiver: Box<Expr>,
        body: Box<Expr>,
    },

    /// Value of a keyword parameter that has no default
    RequiredKeywordValue,
}

impl Expr {
    /// Statement list
    pub fn statements(statements: Vec<Expr>) -> Self {
        Expr::Statements(statements)
    }

    /// Read a method-level local
    pub fn local(name: impl Into<String>) -> Self {
        Expr::LocalVar(name.into())
    }

    /// Read a block-level variable
    pub fn dvar(name: impl Into<String>) -> Self {
        Expr::DynVar(name.into())
    }

    /// Assign a method-level local
    pub fn local_asgn(name: impl Into<String>, value: Expr) -> Self {
        Expr::LocalAsgn {
            name: name.into(),
            value: Box::new(value),
        }
    }

    /// Assign a block-level variable
    pub fn dyn_asgn(name: impl Into<String>, value: Expr) -> Self {
        Expr::DynAsgn {
            name: name.into(),
            value: Box::new(value),
        }
    }

    /// Constant reference
    pub fn constant(name: impl Into<String>) -> Self {
        Expr::Const(name.into())
    }

    /// Symbol literal
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Call without a block
    pub fn call(receiver: Option<Expr>, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(CallNode::new(receiver, name, args)))
    }

    /// Receiverless call with a literal block
    pub fn call_with_block(name: impl Into<String>, args: Vec<Expr>, block: BlockNode) -> Self {
        let mut call = CallNode::new(None, name, args);
        call.block = Some(BlockArg::Literal(block));
        Expr::Call(Box::new(call))
    }

    /// Method definition
    pub fn method_def(def: MethodDefNode) -> Self {
        Expr::MethodDef(Arc::new(def))
    }

    /// Bare `super` without a block
    pub fn zsuper() -> Self {
        Expr::ZSuper { block: None }
    }

    /// Flip-flop over two conditions
    pub fn flip_flop(begin: Expr, end: Expr, exclusive: bool) -> Self {
        Expr::FlipFlop {
            begin: Box::new(begin),
            end: Box::new(end),
            exclusive,
        }
    }
}

/// A method call
#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    /// Explicit receiver (`None` for calls on `self`)
    pub receiver: Option<Expr>,
    /// Method name
    pub name: String,
    /// Arguments, possibly ending in a splat
    pub args: Vec<Expr>,
    /// Attached block
    pub block: Option<BlockArg>,
}

impl CallNode {
    /// Create a call without a block
    pub fn new(receiver: Option<Expr>, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            receiver,
            name: name.into(),
            args,
            block: None,
        }
    }
}

/// Block attached to a call or `super`
#[derive(Debug, Clone, PartialEq)]
pub enum BlockArg {
    /// `do |x| ... end` / `{ |x| ... }`
    Literal(BlockNode),
    /// `&expr`
    Pass(Expr),
}

/// `super(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct SuperNode {
    /// Explicit arguments
    pub args: Vec<Expr>,
    /// Attached block
    pub block: Option<BlockArg>,
}

/// A block or lambda literal
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    /// Parameters
    pub args: ArgsNode,
    /// Body
    pub body: Expr,
    /// Block-local variables (`|a; b, c|`)
    pub locals: Vec<String>,
    /// Lines the block spans
    pub range: SourceRange,
    /// Block synthesized for a `for` statement; its variables live in the
    /// enclosing scope
    pub for_statement: bool,
}

impl BlockNode {
    /// Create a block with no block-locals
    pub fn new(args: ArgsNode, body: Expr, range: SourceRange) -> Self {
        Self {
            args,
            body,
            locals: Vec::new(),
            range,
            for_statement: false,
        }
    }

    /// Declare block-local variables
    pub fn with_locals<I, S>(mut self, locals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locals = locals.into_iter().map(Into::into).collect();
        self
    }
}

/// `def name(args) ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDefNode {
    /// Method name
    pub name: String,
    /// Parameters
    pub args: ArgsNode,
    /// Body
    pub body: Expr,
    /// Lines the definition spans
    pub range: SourceRange,
}

impl MethodDefNode {
    /// Create a method definition
    pub fn new(name: impl Into<String>, args: ArgsNode, body: Expr, range: SourceRange) -> Self {
        Self {
            name: name.into(),
            args,
            body,
            range,
        }
    }
}

/// Parameter list of a method or block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgsNode {
    /// Required parameters before optionals
    pub pre: Vec<String>,
    /// Optional parameters with their defaults
    pub optional: Vec<OptionalParam>,
    /// Rest parameter
    pub rest: Option<RestParam>,
    /// Required parameters after the rest parameter
    pub post: Vec<String>,
    /// Keyword parameters
    pub keywords: Vec<KeywordParam>,
    /// Keyword rest parameter
    pub keyword_rest: Option<KeywordRestParam>,
    /// Block parameter (`&blk`)
    pub block: Option<String>,
}

impl ArgsNode {
    /// Empty parameter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter list with only required parameters
    pub fn required<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pre: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add an optional parameter
    pub fn with_optional(mut self, name: impl Into<String>, default: Expr) -> Self {
        self.optional.push(OptionalParam {
            name: name.into(),
            default,
        });
        self
    }

    /// Set the rest parameter
    pub fn with_rest(mut self, rest: RestParam) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Add a post parameter
    pub fn with_post(mut self, name: impl Into<String>) -> Self {
        self.post.push(name.into());
        self
    }

    /// Add a keyword parameter
    pub fn with_keyword(mut self, keyword: KeywordParam) -> Self {
        self.keywords.push(keyword);
        self
    }

    /// Set the keyword rest parameter
    pub fn with_keyword_rest(mut self, name: Option<&str>) -> Self {
        self.keyword_rest = Some(KeywordRestParam {
            name: name.map(str::to_string),
        });
        self
    }

    /// Set the block parameter
    pub fn with_block(mut self, name: impl Into<String>) -> Self {
        self.block = Some(name.into());
        self
    }

    /// Whether a rest parameter of any kind is present
    pub fn has_rest(&self) -> bool {
        self.rest.is_some()
    }

    /// Whether the list has a keyword section
    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty() || self.keyword_rest.is_some()
    }

    /// Whether the rest parameter is the implicit one of `|a,|`
    pub fn has_trailing_comma_rest(&self) -> bool {
        matches!(self.rest, Some(RestParam::Anonymous { star: false }))
    }
}

/// `name = default`
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalParam {
    /// Parameter name
    pub name: String,
    /// Default value expression
    pub default: Expr,
}

/// Rest parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestParam {
    /// `*name`
    Named(String),
    /// `*` (star) or the implicit rest of `|a,|` (no star)
    Anonymous { star: bool },
}

/// Keyword parameter.
///
/// The parser represents it as an assignment to the parameter's variable
/// whose value is the default, or [`Expr::RequiredKeywordValue`] when the
/// keyword is required.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordParam {
    /// Assignment node (`LocalAsgn` in methods, `DynAsgn` in blocks)
    pub assignable: Expr,
}

impl KeywordParam {
    /// Required keyword in a method
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            assignable: Expr::local_asgn(name, Expr::RequiredKeywordValue),
        }
    }

    /// Keyword with a default in a method
    pub fn optional(name: impl Into<String>, default: Expr) -> Self {
        Self {
            assignable: Expr::local_asgn(name, default),
        }
    }

    /// Keyword with a default in a block
    pub fn block_optional(name: impl Into<String>, default: Expr) -> Self {
        Self {
            assignable: Expr::dyn_asgn(name, default),
        }
    }

    /// Parameter name and default, when the assignable has a supported form
    pub fn target(&self) -> Option<(&str, &Expr)> {
        match &self.assignable {
            Expr::LocalAsgn { name, value } | Expr::DynAsgn { name, value } => {
                Some((name.as_str(), value.as_ref()))
            }
            _ => None,
        }
    }

    /// Whether the keyword has no default
    pub fn is_required(&self) -> bool {
        matches!(self.target(), Some((_, Expr::RequiredKeywordValue)))
    }
}

/// `**name` or `**`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRestParam {
    /// Parameter name, if named
    pub name: Option<String>,
}
