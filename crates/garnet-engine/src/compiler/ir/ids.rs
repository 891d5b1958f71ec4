//! Identifiers used by lowered units

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_ROOT: AtomicU32 = AtomicU32::new(1);

/// Identifier of a method, block or module definition.
///
/// Used as the target of `return` (the definition's return id) and of
/// `break` (a block's break id). Ids form a path: a root per lowering entry
/// point, then one component per nested definition in lowering order. Two
/// lowerings of the same definition under the same parent id therefore
/// produce identical ids, whether eager or deferred.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DefinitionId(Arc<[u32]>);

impl DefinitionId {
    /// A fresh root id, unique within the process
    pub fn fresh_root() -> Self {
        Self::root(NEXT_ROOT.fetch_add(1, Ordering::Relaxed))
    }

    /// A root id with an explicit number
    pub fn root(id: u32) -> Self {
        DefinitionId(Arc::from(vec![id]))
    }

    /// The id of the `index`-th definition nested in this one
    pub fn child(&self, index: u32) -> Self {
        let mut path = self.0.to_vec();
        path.push(index);
        DefinitionId(Arc::from(path))
    }

    /// Nesting depth, zero for a root
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    /// Whether `self` is `other` or nested inside it
    pub fn is_within(&self, other: &DefinitionId) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefinitionId({})", self)
    }
}

/// Local variable slot, `depth` frames out from the reading frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub depth: u32,
    pub index: u32,
}

impl SlotRef {
    pub fn new(depth: u32, index: u32) -> Self {
        Self { depth, index }
    }

    /// Slot in the current frame
    pub fn local(index: u32) -> Self {
        Self { depth: 0, index }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth == 0 {
            write!(f, "%{}", self.index)
        } else {
            write!(f, "%{}^{}", self.index, self.depth)
        }
    }
}

/// Flip-flop cell, owned by the frame `depth` levels out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHandle {
    pub depth: u32,
    pub slot: u32,
}

impl fmt::Display for CellHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell %{}^{}", self.slot, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_id_paths() {
        let root = DefinitionId::root(7);
        let block = root.child(0).child(2);
        assert_eq!(block.to_string(), "d7.0.2");
        assert_eq!(block.depth(), 2);
        assert!(block.is_within(&root));
        assert!(!root.is_within(&block));
        assert_eq!(root.child(1), DefinitionId::root(7).child(1));
    }

    #[test]
    fn test_fresh_roots_are_distinct() {
        let a = DefinitionId::fresh_root();
        let b = DefinitionId::fresh_root();
        assert_ne!(a, b);
    }

    #[test]
    fn test_slot_display() {
        assert_eq!(SlotRef::local(3).to_string(), "%3");
        assert_eq!(SlotRef::new(2, 0).to_string(), "%0^2");
    }
}
