//! Live operator nodes.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use super::slot::SlotId;

/// Stable handle of an instance inside a [`Graph`](super::Graph). Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Executable counterpart of a symbol child.
///
/// Holds handles only; the slots themselves live in the graph arena. The
/// outputs of a composite instance are handles of its innermost child
/// outputs, so they are not necessarily owned by this instance.
#[derive(Debug, Clone)]
pub struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) symbol_id: Uuid,
    pub(crate) symbol_child_id: Uuid,
    pub(crate) name: String,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) is_composite: bool,
    pub(crate) inputs: Vec<(Uuid, SlotId)>,
    pub(crate) outputs: Vec<(Uuid, SlotId)>,
    /// Child symbol id → child instance, composites only
    pub(crate) children: Vec<(Uuid, InstanceId)>,
    /// Every slot this instance owns (inputs, own outputs, placeholders, curves)
    pub(crate) owned_slots: Vec<SlotId>,
    /// Input definition → curve slot animating it
    pub(crate) animations: HashMap<Uuid, SlotId>,
}

impl Instance {
    pub(crate) fn new(
        id: InstanceId,
        symbol_id: Uuid,
        symbol_child_id: Uuid,
        name: &str,
        parent: Option<InstanceId>,
        is_composite: bool,
    ) -> Self {
        Self {
            id,
            symbol_id,
            symbol_child_id,
            name: name.to_string(),
            parent,
            is_composite,
            inputs: Vec::new(),
            outputs: Vec::new(),
            children: Vec::new(),
            owned_slots: Vec::new(),
            animations: HashMap::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn symbol_id(&self) -> Uuid {
        self.symbol_id
    }

    pub fn symbol_child_id(&self) -> Uuid {
        self.symbol_child_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn is_composite(&self) -> bool {
        self.is_composite
    }

    /// Input slots in definition order.
    pub fn inputs(&self) -> &[(Uuid, SlotId)] {
        &self.inputs
    }

    /// Output slots in definition order.
    pub fn outputs(&self) -> &[(Uuid, SlotId)] {
        &self.outputs
    }

    pub fn input_slot(&self, definition_id: Uuid) -> Option<SlotId> {
        lookup(&self.inputs, definition_id)
    }

    pub fn output_slot(&self, definition_id: Uuid) -> Option<SlotId> {
        lookup(&self.outputs, definition_id)
    }

    pub fn children(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.children.iter().map(|(_, id)| *id)
    }

    /// Child instance realizing the symbol child `child_id`.
    pub fn child(&self, child_id: Uuid) -> Option<InstanceId> {
        lookup(&self.children, child_id)
    }

    pub fn owns(&self, slot: SlotId) -> bool {
        self.owned_slots.contains(&slot)
    }

    pub fn animation(&self, input_definition_id: Uuid) -> Option<SlotId> {
        self.animations.get(&input_definition_id).copied()
    }

    pub(crate) fn set_output(&mut self, definition_id: Uuid, slot: SlotId) {
        match self.outputs.iter_mut().find(|(id, _)| *id == definition_id) {
            Some(entry) => entry.1 = slot,
            None => self.outputs.push((definition_id, slot)),
        }
    }
}

fn lookup<K: PartialEq + Copy, V: Copy>(entries: &[(K, V)], key: K) -> Option<V> {
    entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
