//! Executable units and the definitions that own them

use std::sync::Arc;

use super::ids::DefinitionId;
use super::node::Node;
use crate::compiler::error::LowerResult;
use crate::compiler::lower::arity::Arity;
use crate::compiler::lower::lazy::DeferredUnit;
use crate::parser::SourceRange;

/// What a unit was lowered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    TopLevel,
    Module,
    Method,
    Proc,
    Lambda,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::TopLevel => "toplevel",
            UnitKind::Module => "module",
            UnitKind::Method => "method",
            UnitKind::Proc => "proc",
            UnitKind::Lambda => "lambda",
        }
    }
}

/// Invocation discipline of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcType {
    /// Lenient: no entry arity check, lone array arguments destructured
    Proc,
    /// Strict: arity checked, `return` is local
    Lambda,
}

/// Local variable layout of a frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameLayout {
    /// Slot names, indexed by slot number
    pub slots: Vec<String>,
    /// Whether the frame reads slots of the frame it was declared in
    pub needs_declaration_frame: bool,
}

impl FrameLayout {
    /// Slot number of `name`
    pub fn slot_of(&self, name: &str) -> Option<u32> {
        self.slots.iter().position(|s| s == name).map(|i| i as u32)
    }
}

/// A callable unit handed to the runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableUnit {
    /// Method or call name, for backtraces
    pub name: String,
    pub kind: UnitKind,
    pub root: Node,
    /// Declared arity
    pub arity: Arity,
    /// Target of `return` signals caught by this unit
    pub return_id: DefinitionId,
    pub frame: FrameLayout,
    /// Preferred source range for diagnostics
    pub source_range: SourceRange,
}

impl ExecutableUnit {
    /// Number of nodes in the operation tree
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

/// A lowered block: one body, two invocation disciplines
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefinition {
    /// Discipline requested at the definition site
    pub proc_type: ProcType,
    pub proc_unit: Arc<ExecutableUnit>,
    pub lambda_unit: Arc<ExecutableUnit>,
    pub arity: Arity,
    /// Matches `break` signals back to the defining call
    pub break_id: DefinitionId,
    /// Slot in the defining frame holding the defining call's live-frame
    /// marker. `None` for lambdas and blocks passed to `super`, whose
    /// `break` never consults one.
    pub frame_on_stack_marker: Option<u32>,
    pub needs_declaration_frame: bool,
    pub source_range: SourceRange,
}

impl BlockDefinition {
    /// Unit for the given discipline
    pub fn unit(&self, proc_type: ProcType) -> &Arc<ExecutableUnit> {
        match proc_type {
            ProcType::Proc => &self.proc_unit,
            ProcType::Lambda => &self.lambda_unit,
        }
    }

    /// Unit for the discipline requested at the definition site
    pub fn default_unit(&self) -> &Arc<ExecutableUnit> {
        self.unit(self.proc_type)
    }
}

/// Body of a method definition
#[derive(Debug, Clone)]
pub enum MethodBody {
    Ready(Arc<ExecutableUnit>),
    /// Lowered on first use
    Deferred(Arc<DeferredUnit>),
}

/// A lowered method definition
#[derive(Debug, Clone)]
pub struct MethodDefinition {
    pub name: String,
    pub definition_id: DefinitionId,
    pub arity: Arity,
    pub source_range: SourceRange,
    pub body: MethodBody,
}

impl MethodDefinition {
    /// The method's unit, lowering a deferred body if needed
    pub fn unit(&self) -> LowerResult<Arc<ExecutableUnit>> {
        match &self.body {
            MethodBody::Ready(unit) => Ok(Arc::clone(unit)),
            MethodBody::Deferred(deferred) => deferred.force(),
        }
    }

    /// Whether the body has been lowered
    pub fn is_lowered(&self) -> bool {
        match &self.body {
            MethodBody::Ready(_) => true,
            MethodBody::Deferred(deferred) => deferred.is_forced(),
        }
    }
}

impl PartialEq for MethodDefinition {
    fn eq(&self, other: &Self) -> bool {
        let same_body = match (&self.body, &other.body) {
            (MethodBody::Ready(a), MethodBody::Ready(b)) => a == b,
            (MethodBody::Deferred(a), MethodBody::Deferred(b)) => {
                a.definition_id() == b.definition_id()
            }
            _ => false,
        };
        same_body
            && self.name == other.name
            && self.definition_id == other.definition_id
            && self.arity == other.arity
            && self.source_range == other.source_range
    }
}
