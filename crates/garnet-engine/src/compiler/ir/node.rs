//! Operation tree
//!
//! A lowered unit is a tree of `Node`s. Argument reads, control signals and
//! the catch boundaries around bodies are explicit nodes so the runtime can
//! execute a unit without consulting the AST again.

use std::sync::Arc;

use super::ids::{CellHandle, DefinitionId, SlotRef};
use super::unit::{BlockDefinition, ExecutableUnit, MethodDefinition};
use crate::compiler::lower::arity::Arity;

/// Literal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    True,
    False,
    Integer(i64),
    Str(String),
    Symbol(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::True => write!(f, "true"),
            Literal::False => write!(f, "false"),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Symbol(s) => write!(f, ":{}", s),
        }
    }
}

/// How a constant reference is resolved at run time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantLookup {
    /// Through the lexical scope path, outermost first
    Lexical(Vec<String>),
    /// Through the receiver's singleton class ancestry
    Dynamic,
}

/// Behaviour of a missing positional argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingArgument {
    /// Procs bind missing arguments to nil
    Nil,
    /// Raise a runtime error
    Error,
}

/// Where positional parameters are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentSource {
    /// The incoming call frame
    Call,
    /// An array held in a local slot (destructured single argument)
    Array(SlotRef),
}

/// Exception translation applied by [`Node::TranslateExceptions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedOperationBehavior {
    /// Unsupported operations surface as a guest `TypeError`
    TypeError,
}

/// A node of the lowered operation tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // ========================================================================
    // Values
    // ========================================================================
    Nil,
    Literal(Literal),
    SelfValue,
    /// Evaluate in order, yielding the last value
    Sequence(Vec<Node>),
    /// Subtree shared between units
    Shared(Arc<Node>),
    ReadLocal(SlotRef),
    WriteLocal {
        slot: SlotRef,
        value: Box<Node>,
    },
    ReadConstant {
        name: String,
        lookup: ConstantLookup,
    },
    Call {
        receiver: Box<Node>,
        name: String,
        args: Vec<Node>,
        block: Option<Box<Node>>,
    },
    /// Publish a live-frame marker in `marker` for the duration of `call`,
    /// so a proc's `break` can tell whether its defining call still runs
    FrameOnStack {
        marker: u32,
        call: Box<Node>,
    },
    Splat(Box<Node>),
    /// `&expr` block pass
    ToProc(Box<Node>),

    // ========================================================================
    // Control flow
    // ========================================================================
    If {
        cond: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },
    And(Box<Node>, Box<Node>),
    Not(Box<Node>),
    IsNil(Box<Node>),
    While {
        cond: Box<Node>,
        body: Box<Node>,
    },
    FlipFlop {
        cell: CellHandle,
        begin: Box<Node>,
        end: Box<Node>,
        exclusive: bool,
    },
    /// Allocate and reset the listed flip-flop cells of this frame
    InitFlipFlopCells(Vec<u32>),

    // ========================================================================
    // Argument binding
    // ========================================================================
    ReadPreArgument {
        source: ArgumentSource,
        index: usize,
        missing: MissingArgument,
    },
    /// Optional parameter, falling back to `default` when fewer than
    /// `min_count` positionals were given
    ReadOptionalArgument {
        source: ArgumentSource,
        index: usize,
        min_count: usize,
        default: Box<Node>,
    },
    /// Positionals from `start` up to `trailing` from the end
    ReadRestArguments {
        source: ArgumentSource,
        start: usize,
        trailing: usize,
        keywords_stripped: bool,
    },
    ReadPostArgument {
        source: ArgumentSource,
        index: usize,
        pre: usize,
        optional: usize,
        post: usize,
    },
    /// Keyword argument; `default` is `None` for a required keyword
    ReadKeywordArgument {
        name: String,
        default: Option<Box<Node>>,
    },
    ReadKeywordRestArguments {
        excluded: Vec<String>,
    },
    ReadBlockArgument,
    KeywordHash {
        entries: Vec<(String, Node)>,
        rest: Option<Box<Node>>,
    },
    /// Whether a lone argument should be spread over the parameters
    ShouldDestructure(Box<Node>),
    /// Convert to an array, nil when not convertible
    ArrayCast(Box<Node>),
    CheckArity(Arity),

    // ========================================================================
    // Control signals and their boundaries
    // ========================================================================
    Return {
        return_id: DefinitionId,
        value: Box<Node>,
    },
    /// `return` inside a block: local when run as a lambda, otherwise
    /// returns from the enclosing method
    BlockReturn {
        lambda_id: DefinitionId,
        method_id: Option<DefinitionId>,
        value: Box<Node>,
    },
    Next(Box<Node>),
    LoopNext,
    Break {
        break_id: DefinitionId,
        value: Box<Node>,
    },
    LoopBreak(Box<Node>),
    CatchForMethod {
        return_id: DefinitionId,
        body: Box<Node>,
    },
    CatchForProc(Box<Node>),
    CatchForLambda {
        return_id: DefinitionId,
        body: Box<Node>,
    },
    TranslateExceptions {
        behavior: UnsupportedOperationBehavior,
        body: Box<Node>,
    },
    Instrument(Box<Node>),

    // ========================================================================
    // Super
    // ========================================================================
    SuperCall {
        method_name: Option<String>,
        arguments: Box<Node>,
        block: Box<Node>,
    },
    ReadSuperArguments {
        args: Vec<Node>,
        splatted: bool,
    },
    ReadZSuperArguments {
        rest_index: Option<usize>,
        reloads: Vec<Node>,
    },
    ReadInheritedBlock,
    SuperOutsideMethod {
        inside_define_method: bool,
    },

    // ========================================================================
    // Definitions
    // ========================================================================
    Primitive {
        name: String,
        fallback: Box<Node>,
    },
    BlockDefinition(Arc<BlockDefinition>),
    MethodDefinition(Arc<MethodDefinition>),
    ModuleDefinition {
        name: String,
        body: Arc<ExecutableUnit>,
    },
    SingletonClassDefinition {
        receiver: Box<Node>,
        body: Arc<ExecutableUnit>,
    },
}

impl Node {
    pub fn boxed(self) -> Box<Node> {
        Box::new(self)
    }

    pub fn write_local(slot: SlotRef, value: Node) -> Node {
        Node::WriteLocal {
            slot,
            value: Box::new(value),
        }
    }

    /// Collapse trivial sequences
    pub fn sequence(mut nodes: Vec<Node>) -> Node {
        match nodes.len() {
            0 => Node::Nil,
            1 => nodes.remove(0),
            _ => Node::Sequence(nodes),
        }
    }

    /// Short name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Nil => "nil",
            Node::Literal(_) => "literal",
            Node::SelfValue => "self",
            Node::Sequence(_) => "sequence",
            Node::Shared(_) => "shared",
            Node::ReadLocal(_) => "read_local",
            Node::WriteLocal { .. } => "write_local",
            Node::ReadConstant { .. } => "read_constant",
            Node::Call { .. } => "call",
            Node::FrameOnStack { .. } => "frame_on_stack",
            Node::Splat(_) => "splat",
            Node::ToProc(_) => "to_proc",
            Node::If { .. } => "if",
            Node::And(..) => "and",
            Node::Not(_) => "not",
            Node::IsNil(_) => "is_nil",
            Node::While { .. } => "while",
            Node::FlipFlop { .. } => "flip_flop",
            Node::InitFlipFlopCells(_) => "init_flip_flop_cells",
            Node::ReadPreArgument { .. } => "read_pre_argument",
            Node::ReadOptionalArgument { .. } => "read_optional_argument",
            Node::ReadRestArguments { .. } => "read_rest_arguments",
            Node::ReadPostArgument { .. } => "read_post_argument",
            Node::ReadKeywordArgument { .. } => "read_keyword_argument",
            Node::ReadKeywordRestArguments { .. } => "read_keyword_rest_arguments",
            Node::ReadBlockArgument => "read_block_argument",
            Node::KeywordHash { .. } => "keyword_hash",
            Node::ShouldDestructure(_) => "should_destructure",
            Node::ArrayCast(_) => "array_cast",
            Node::CheckArity(_) => "check_arity",
            Node::Return { .. } => "return",
            Node::BlockReturn { .. } => "block_return",
            Node::Next(_) => "next",
            Node::LoopNext => "loop_next",
            Node::Break { .. } => "break",
            Node::LoopBreak(_) => "loop_break",
            Node::CatchForMethod { .. } => "catch_for_method",
            Node::CatchForProc(_) => "catch_for_proc",
            Node::CatchForLambda { .. } => "catch_for_lambda",
            Node::TranslateExceptions { .. } => "translate_exceptions",
            Node::Instrument(_) => "instrument",
            Node::SuperCall { .. } => "super_call",
            Node::ReadSuperArguments { .. } => "read_super_arguments",
            Node::ReadZSuperArguments { .. } => "read_zsuper_arguments",
            Node::ReadInheritedBlock => "read_inherited_block",
            Node::SuperOutsideMethod { .. } => "super_outside_method",
            Node::Primitive { .. } => "primitive",
            Node::BlockDefinition(_) => "block_definition",
            Node::MethodDefinition(_) => "method_definition",
            Node::ModuleDefinition { .. } => "module_definition",
            Node::SingletonClassDefinition { .. } => "singleton_class_definition",
        }
    }

    /// Direct children, in evaluation order.
    ///
    /// Definitions are leaves: their units are separate trees.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Sequence(nodes) => nodes.iter().collect(),
            Node::Shared(inner) => vec![inner.as_ref()],
            Node::WriteLocal { value, .. } => vec![value.as_ref()],
            Node::Call {
                receiver,
                args,
                block,
                ..
            } => {
                let mut out = vec![receiver.as_ref()];
                out.extend(args.iter());
                if let Some(block) = block {
                    out.push(block.as_ref());
                }
                out
            }
            Node::Splat(inner)
            | Node::ToProc(inner)
            | Node::Not(inner)
            | Node::IsNil(inner)
            | Node::ShouldDestructure(inner)
            | Node::ArrayCast(inner)
            | Node::FrameOnStack { call: inner, .. }
            | Node::Next(inner)
            | Node::LoopBreak(inner)
            | Node::CatchForProc(inner)
            | Node::Instrument(inner) => vec![inner.as_ref()],
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => vec![cond.as_ref(), then_branch.as_ref(), else_branch.as_ref()],
            Node::And(lhs, rhs) => vec![lhs.as_ref(), rhs.as_ref()],
            Node::While { cond, body } => vec![cond.as_ref(), body.as_ref()],
            Node::FlipFlop { begin, end, .. } => vec![begin.as_ref(), end.as_ref()],
            Node::ReadOptionalArgument { default, .. } => vec![default.as_ref()],
            Node::ReadKeywordArgument { default, .. } => {
                default.iter().map(|d| d.as_ref()).collect()
            }
            Node::KeywordHash { entries, rest } => {
                let mut out: Vec<&Node> = entries.iter().map(|(_, n)| n).collect();
                if let Some(rest) = rest {
                    out.push(rest.as_ref());
                }
                out
            }
            Node::Return { value, .. }
            | Node::BlockReturn { value, .. }
            | Node::Break { value, .. } => vec![value.as_ref()],
            Node::CatchForMethod { body, .. }
            | Node::CatchForLambda { body, .. }
            | Node::TranslateExceptions { body, .. } => vec![body.as_ref()],
            Node::SuperCall {
                arguments, block, ..
            } => vec![arguments.as_ref(), block.as_ref()],
            Node::ReadSuperArguments { args, .. } => args.iter().collect(),
            Node::ReadZSuperArguments { reloads, .. } => reloads.iter().collect(),
            Node::Primitive { fallback, .. } => vec![fallback.as_ref()],
            Node::SingletonClassDefinition { receiver, .. } => vec![receiver.as_ref()],
            Node::Nil
            | Node::Literal(_)
            | Node::SelfValue
            | Node::ReadLocal(_)
            | Node::ReadConstant { .. }
            | Node::InitFlipFlopCells(_)
            | Node::ReadPreArgument { .. }
            | Node::ReadRestArguments { .. }
            | Node::ReadPostArgument { .. }
            | Node::ReadKeywordRestArguments { .. }
            | Node::ReadBlockArgument
            | Node::CheckArity(_)
            | Node::LoopNext
            | Node::ReadInheritedBlock
            | Node::SuperOutsideMethod { .. }
            | Node::BlockDefinition(_)
            | Node::MethodDefinition(_)
            | Node::ModuleDefinition { .. } => Vec::new(),
        }
    }

    /// Number of nodes in this tree, definitions counted as one
    pub fn node_count(&self) -> usize {
        1 + self.children().into_iter().map(Node::node_count).sum::<usize>()
    }

    /// Pre-order search
    pub fn find<F: Fn(&Node) -> bool>(&self, pred: &F) -> Option<&Node> {
        if pred(self) {
            return Some(self);
        }
        self.children().into_iter().find_map(|child| child.find(pred))
    }

    /// Whether any node in this tree satisfies `pred`
    pub fn contains<F: Fn(&Node) -> bool>(&self, pred: &F) -> bool {
        self.find(pred).is_some()
    }
}
