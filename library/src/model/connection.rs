//! Connection model for the operator graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a slot on a child of a composite symbol.
///
/// The nil child id designates the composite symbol's own boundary: a source on
/// the boundary is one of the composite's inputs, a target on the boundary is
/// one of its outputs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub child_id: Uuid,
    pub slot_id: Uuid,
}

impl SlotRef {
    pub fn new(child_id: Uuid, slot_id: Uuid) -> Self {
        Self { child_id, slot_id }
    }

    /// A slot on the parent symbol itself.
    pub fn boundary(slot_id: Uuid) -> Self {
        Self {
            child_id: Uuid::nil(),
            slot_id,
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.child_id.is_nil()
    }
}

/// A wire between two slots (an edge in the operator graph).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Output of a child, or an input of the parent boundary
    pub source: SlotRef,
    /// Input of a child, or an output of the parent boundary
    pub target: SlotRef,
    /// Position among the sources of a multi-input (appended when `None`)
    #[serde(default)]
    pub multi_input_index: Option<usize>,
}

impl Connection {
    pub fn new(source: SlotRef, target: SlotRef) -> Self {
        Self {
            source,
            target,
            multi_input_index: None,
        }
    }

    pub fn with_multi_input_index(mut self, index: usize) -> Self {
        self.multi_input_index = Some(index);
        self
    }

    pub fn touches_child(&self, child_id: Uuid) -> bool {
        self.source.child_id == child_id || self.target.child_id == child_id
    }
}
