//! Lowered representation
//!
//! Output of the lowering pass:
//! - `node`: the operation tree
//! - `unit`: executable units and the method/block definitions owning them
//! - `ids`: definition ids, slots and flip-flop cells
//! - `entry`: straight-line entry checks against a call shape
//! - `pretty`: human-readable dumps

pub mod entry;
pub mod ids;
pub mod node;
pub mod pretty;
pub mod unit;

pub use entry::CallShape;
pub use ids::{CellHandle, DefinitionId, SlotRef};
pub use node::{
    ArgumentSource, ConstantLookup, Literal, MissingArgument, Node, UnsupportedOperationBehavior,
};
pub use pretty::PrettyPrint;
pub use unit::{
    BlockDefinition, ExecutableUnit, FrameLayout, MethodBody, MethodDefinition, ProcType,
    UnitKind,
};
