//! Lowering contexts
//!
//! One context per method, block, module body or program being lowered.
//! Contexts live in an arena owned by the `Lowerer`; a block's parent link
//! is an index into that arena and is only followed upward (local
//! resolution, bare `super`, flip-flop cells).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::compiler::ir::{DefinitionId, FrameLayout};
use crate::parser::ast::MethodDefNode;

/// Index of a context in the lowering arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u32);

impl ContextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a context lowers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    TopLevel,
    Module,
    Method,
    Block,
}

/// Per-definition lowering state
#[derive(Debug, Clone)]
pub struct LoweringContext {
    pub kind: ContextKind,
    /// Enclosing context, for blocks
    pub parent: Option<ContextId>,
    /// Return id of this definition; break id for blocks
    pub definition: DefinitionId,
    /// Method definition, for method contexts
    pub method: Option<Arc<MethodDefNode>>,
    /// Name of the call a block is attached to
    pub attached_call: Option<String>,
    /// Set when the frame reads slots of an enclosing frame
    pub needs_declaration_frame: bool,
    /// Slot names in declaration order
    locals: Vec<String>,
    local_map: FxHashMap<String, u32>,
    flip_flop_cells: Vec<u32>,
    loop_depth: u32,
    next_child: u32,
    next_temp: u32,
}

impl LoweringContext {
    pub fn new(kind: ContextKind, parent: Option<ContextId>, definition: DefinitionId) -> Self {
        Self {
            kind,
            parent,
            definition,
            method: None,
            attached_call: None,
            needs_declaration_frame: false,
            locals: Vec::new(),
            local_map: FxHashMap::default(),
            flip_flop_cells: Vec::new(),
            loop_depth: 0,
            next_child: 0,
            next_temp: 0,
        }
    }

    pub fn is_block(&self) -> bool {
        self.kind == ContextKind::Block
    }

    /// Declare a local, returning its slot. Redeclaring returns the
    /// existing slot.
    pub fn declare(&mut self, name: &str) -> u32 {
        if let Some(&slot) = self.local_map.get(name) {
            return slot;
        }
        let slot = self.locals.len() as u32;
        self.locals.push(name.to_string());
        self.local_map.insert(name.to_string(), slot);
        slot
    }

    /// Slot of a local declared in this context
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.local_map.get(name).copied()
    }

    /// Declare a fresh hidden local named `%{prefix}_{n}`
    pub fn allocate_temp(&mut self, prefix: &str) -> u32 {
        let name = format!("%{}_{}", prefix, self.next_temp);
        self.next_temp += 1;
        self.declare(&name)
    }

    /// Declare a flip-flop cell owned by this frame
    pub fn allocate_flip_flop_cell(&mut self) -> u32 {
        let slot = self.allocate_temp("flipflop");
        self.flip_flop_cells.push(slot);
        slot
    }

    /// Flip-flop cells owned by this frame
    pub fn flip_flop_cells(&self) -> &[u32] {
        &self.flip_flop_cells
    }

    /// Id for the next definition nested in this one
    pub fn next_child_id(&mut self) -> DefinitionId {
        let id = self.definition.child(self.next_child);
        self.next_child += 1;
        id
    }

    pub fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub fn exit_loop(&mut self) {
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    pub fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }

    pub fn frame_layout(&self) -> FrameLayout {
        FrameLayout {
            slots: self.locals.clone(),
            needs_declaration_frame: self.needs_declaration_frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> LoweringContext {
        LoweringContext::new(ContextKind::Method, None, DefinitionId::root(1))
    }

    #[test]
    fn test_declare_is_idempotent() {
        let mut ctx = context();
        assert_eq!(ctx.declare("a"), 0);
        assert_eq!(ctx.declare("b"), 1);
        assert_eq!(ctx.declare("a"), 0);
        assert_eq!(ctx.lookup("b"), Some(1));
        assert_eq!(ctx.lookup("c"), None);
    }

    #[test]
    fn test_temps_and_cells() {
        let mut ctx = context();
        ctx.declare("x");
        let temp = ctx.allocate_temp("destructure");
        let cell = ctx.allocate_flip_flop_cell();

        assert_eq!(temp, 1);
        assert_eq!(cell, 2);
        assert_eq!(ctx.flip_flop_cells(), &[2]);
        assert_eq!(
            ctx.frame_layout().slots,
            vec!["x", "%destructure_0", "%flipflop_1"]
        );
    }

    #[test]
    fn test_child_ids() {
        let mut ctx = context();
        assert_eq!(ctx.next_child_id().to_string(), "d1.0");
        assert_eq!(ctx.next_child_id().to_string(), "d1.1");
    }
}
