//! Cacheable computation cells.

use std::fmt;

use uuid::Uuid;

use super::decorator::UpdateChain;
use super::dirty_flag::DirtyFlag;
use super::instance::InstanceId;
use crate::model::output_data::OutputData;
use crate::model::value::{SlotValue, ValueType};

/// Stable handle of a slot inside a [`Graph`](super::Graph). Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// Where a slot's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotKind {
    /// Computed by an operator (or a placeholder for an unconnected composite output)
    Output,
    /// Single-valued input: the connected source if any, the local value otherwise
    Input {
        local: SlotValue,
        source: Option<SlotId>,
    },
    /// Ordered list of connected sources
    MultiInput { sources: Vec<SlotId> },
    /// Keyframed curve driving an animated input
    Curve,
}

impl SlotKind {
    pub fn is_input(&self) -> bool {
        matches!(self, SlotKind::Input { .. } | SlotKind::MultiInput { .. })
    }
}

pub struct Slot {
    pub(crate) id: SlotId,
    pub(crate) owner: InstanceId,
    /// Input/output definition this slot realizes (nil for curve slots)
    pub(crate) definition_id: Uuid,
    pub(crate) value_type: ValueType,
    pub(crate) kind: SlotKind,
    pub(crate) value: SlotValue,
    pub(crate) dirty_flag: DirtyFlag,
    /// Slots invalidated whenever this one is
    pub(crate) dependents: Vec<SlotId>,
    pub(crate) chain: UpdateChain,
    pub(crate) output_data: Option<Box<dyn OutputData>>,
    pub(crate) update_count: u64,
}

impl Slot {
    pub(crate) fn new(
        id: SlotId,
        owner: InstanceId,
        definition_id: Uuid,
        value_type: ValueType,
        kind: SlotKind,
        value: SlotValue,
        chain: UpdateChain,
    ) -> Self {
        Self {
            id,
            owner,
            definition_id,
            value_type,
            kind,
            value,
            dirty_flag: DirtyFlag::default(),
            dependents: Vec::new(),
            chain,
            output_data: None,
            update_count: 0,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn definition_id(&self) -> Uuid {
        self.definition_id
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn kind(&self) -> &SlotKind {
        &self.kind
    }

    /// Cached value, possibly stale.
    pub fn value(&self) -> &SlotValue {
        &self.value
    }

    pub fn dirty_flag(&self) -> &DirtyFlag {
        &self.dirty_flag
    }

    pub fn dependents(&self) -> &[SlotId] {
        &self.dependents
    }

    pub fn is_disabled(&self) -> bool {
        self.chain.is_disabled()
    }

    pub fn decorator_count(&self) -> usize {
        self.chain.decorator_count()
    }

    /// Number of successful recomputes since creation.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn output_data(&self) -> Option<&dyn OutputData> {
        self.output_data.as_deref()
    }

    /// Connected sources, in order. Empty for outputs and unconnected inputs.
    pub fn sources(&self) -> Vec<SlotId> {
        match &self.kind {
            SlotKind::Input {
                source: Some(source),
                ..
            } => vec![*source],
            SlotKind::MultiInput { sources } => sources.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn add_dependent(&mut self, dependent: SlotId) {
        if !self.dependents.contains(&dependent) {
            self.dependents.push(dependent);
        }
    }

    pub(crate) fn remove_dependent(&mut self, dependent: SlotId) {
        self.dependents.retain(|d| *d != dependent);
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("definition_id", &self.definition_id)
            .field("value_type", &self.value_type)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("dirty_flag", &self.dirty_flag)
            .field("dependents", &self.dependents)
            .field("disabled", &self.chain.is_disabled())
            .finish()
    }
}

/// Declared shape of one slot, for drawing parameter widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub id: SlotId,
    pub definition_id: Uuid,
    pub name: String,
    pub value_type: ValueType,
    pub is_multi_input: bool,
    pub is_connected: bool,
}
