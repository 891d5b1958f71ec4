//! Flip-flop cells
//!
//! A flip-flop keeps its state in a cell owned by the nearest non-block
//! frame. Blocks forward registration outward, so every invocation of a
//! block shares the cell with the method that created it.

use super::context::ContextId;
use super::Lowerer;
use crate::compiler::ir::{CellHandle, Node};

impl Lowerer {
    /// Register a cell for a flip-flop in the current context
    pub(crate) fn register_flip_flop_cell(&mut self) -> CellHandle {
        self.register_cell(self.current, 0)
    }

    /// Register a cell for `id`, `depth` frames out from the user
    pub(crate) fn register_cell(&mut self, id: ContextId, depth: u32) -> CellHandle {
        let mut id = id;
        let mut depth = depth;
        loop {
            let ctx = self.ctx_mut(id);
            match ctx.parent {
                Some(parent) if ctx.is_block() => {
                    ctx.needs_declaration_frame = true;
                    id = parent;
                    depth += 1;
                }
                _ => {
                    let slot = ctx.allocate_flip_flop_cell();
                    log::trace!("[Lowering] flip-flop cell %{} at depth {}", slot, depth);
                    return CellHandle { depth, slot };
                }
            }
        }
    }

    /// Cell initialization for the cells owned by `id`
    fn flip_flop_init(&self, id: ContextId) -> Option<Node> {
        let cells = self.ctx(id).flip_flop_cells();
        if cells.is_empty() {
            None
        } else {
            Some(Node::InitFlipFlopCells(cells.to_vec()))
        }
    }

    /// Prepend cell initialization to `body` when `id` owns cells
    pub(crate) fn with_flip_flop_init(&self, id: ContextId, body: Node) -> Node {
        match self.flip_flop_init(id) {
            Some(init) => Node::Sequence(vec![init, body]),
            None => body,
        }
    }
}
