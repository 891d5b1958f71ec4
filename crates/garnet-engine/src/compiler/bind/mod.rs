//! Argument binding
//!
//! Turns a parameter list into the operations that fill its local slots.
//! The lowering pass only sees the [`ArgumentBinder`] trait, so a runtime
//! can plug in its own binding strategy; [`LoadArgumentsBinder`] is the
//! stock implementation.
//!
//! Three modes are requested:
//! - `Load`: read parameters from the incoming call
//! - `Destructure`: read positional parameters from an array held in a slot
//! - `Reload`: re-read every parameter's current slot value for bare `super`

pub mod collect;
pub mod load;
pub mod reload;

use crate::compiler::error::LowerResult;
use crate::compiler::ir::{Node, SlotRef};
use crate::parser::ast::{ArgsNode, Expr};

pub use collect::collect_parameters;
pub use load::LoadArgumentsBinder;

/// Hidden local holding an anonymous `*` rest, so bare `super` can forward it
pub const ANONYMOUS_REST: &str = "%anonymous_rest";

/// What a bind produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Read from the call; procs bind missing arguments to nil
    Load { is_proc: bool },
    /// Read positionals from the array in `array`
    Destructure { array: SlotRef },
    /// Re-read parameter slots for bare `super`
    Reload,
}

/// Result of a bind
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundArguments {
    /// Operations in parameter order
    pub ops: Vec<Node>,
    /// Position in `ops` of the rest parameter's value (reload mode)
    pub rest_index: Option<usize>,
}

impl BoundArguments {
    pub fn into_sequence(self) -> Node {
        Node::Sequence(self.ops)
    }
}

/// Services the lowering pass offers to a binder
pub trait BindHost {
    /// Slot of a declared parameter, as seen from the frame being bound
    fn resolve_parameter(&mut self, name: &str) -> LowerResult<SlotRef>;

    /// Lower a default value expression in the frame being bound
    fn lower_default(&mut self, expr: &Expr) -> LowerResult<Node>;
}

/// Produces the operations binding a parameter list
pub trait ArgumentBinder: Send + Sync {
    fn bind(
        &self,
        args: &ArgsNode,
        mode: BindMode,
        host: &mut dyn BindHost,
    ) -> LowerResult<BoundArguments>;
}
