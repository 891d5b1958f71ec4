//! Compiler module: lowering of methods and blocks into executable units
//!
//! - `lower`: the lowering pass (`Lowerer`), arity model and deferred bodies
//! - `bind`: argument binding strategies
//! - `ir`: the operation tree and executable units
//! - `options`: `LowerOptions`, loadable from TOML

pub mod bind;
pub mod error;
pub mod ir;
pub mod lower;
pub mod options;

pub use bind::{ArgumentBinder, BindHost, BindMode, BoundArguments, LoadArgumentsBinder};
pub use error::{GuestError, LowerError, LowerResult};
pub use ir::{
    BlockDefinition, CallShape, DefinitionId, ExecutableUnit, MethodBody, MethodDefinition, Node,
    PrettyPrint, ProcType, UnitKind,
};
pub use lower::arity::{should_destructure, Arity};
pub use lower::{DeferredUnit, LazySnapshot, Lowerer};
pub use options::{ConfigError, LowerOptions, PrimitiveMarker};
