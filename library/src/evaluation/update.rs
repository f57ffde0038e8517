//! The handle an update function works through while recomputing its slot.

use std::sync::Arc;

use log::warn;
use uuid::Uuid;

use super::context::EvaluationContext;
use crate::error::LibraryError;
use crate::model::output_data::OutputData;
use crate::model::value::{SlotValue, TryGetValue, ValueType};
use crate::runtime::{Graph, InstanceId, SlotId};

/// Computation attached to a slot.
///
/// Runs with exclusive access to the graph, but only the value staged with
/// [`UpdateContext::set_value`] is written back, and only on success.
pub type UpdateAction =
    Arc<dyn Fn(&mut UpdateContext<'_>) -> Result<(), LibraryError> + Send + Sync>;

pub struct UpdateContext<'a> {
    graph: &'a mut Graph,
    slot: SlotId,
    instance: InstanceId,
    context: &'a EvaluationContext,
    pending: Option<SlotValue>,
    time_varying: bool,
    keep_dirty: bool,
}

/// What an update left behind for the graph to commit.
pub(crate) struct UpdateOutcome {
    pub pending: Option<SlotValue>,
    pub time_varying: bool,
    pub keep_dirty: bool,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        graph: &'a mut Graph,
        slot: SlotId,
        instance: InstanceId,
        context: &'a EvaluationContext,
    ) -> Self {
        Self {
            graph,
            slot,
            instance,
            context,
            pending: None,
            time_varying: false,
            keep_dirty: false,
        }
    }

    pub(crate) fn finish(self) -> UpdateOutcome {
        UpdateOutcome {
            pending: self.pending,
            time_varying: self.time_varying,
            keep_dirty: self.keep_dirty,
        }
    }

    /// Slot being recomputed.
    pub fn slot_id(&self) -> SlotId {
        self.slot
    }

    /// Instance owning the slot being recomputed.
    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    pub fn context(&self) -> &EvaluationContext {
        self.context
    }

    pub fn local_time(&self) -> f64 {
        self.context.local_time()
    }

    pub fn frame_id(&self) -> u64 {
        self.context.frame_id()
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Stage the new value of this slot.
    pub fn set_value(&mut self, value: impl Into<SlotValue>) {
        self.pending = Some(value.into());
    }

    /// The value this slot will hold after the update: the staged value if any,
    /// the cached one otherwise.
    pub fn current_value(&self) -> SlotValue {
        match &self.pending {
            Some(value) => value.clone(),
            None => self
                .graph
                .slot(self.slot)
                .map(|s| s.value().clone())
                .unwrap_or_default(),
        }
    }

    /// Leave the slot dirty after this update.
    pub fn keep_dirty(&mut self) {
        self.keep_dirty = true;
    }

    /// Treat this recompute as depending on time even without time-varying inputs.
    pub fn mark_time_varying(&mut self) {
        self.time_varying = true;
    }

    /// Pull the value of another slot.
    ///
    /// A failing upstream recompute is logged and its last good value is used,
    /// so one broken node does not halt the rest of the graph. Cyclic
    /// evaluation is still reported.
    pub fn pull(&mut self, source: SlotId) -> Result<SlotValue, LibraryError> {
        let value = match self.graph.evaluate(source, self.context) {
            Ok(value) => value,
            Err(err @ LibraryError::CyclicEvaluation(_)) => return Err(err),
            Err(err @ LibraryError::SlotNotFound(_)) => return Err(err),
            Err(err) => {
                warn!(
                    "Update of {} failed, using its last value for {}: {}",
                    source, self.slot, err
                );
                self.graph.cached_value(source)?
            }
        };
        if self
            .graph
            .slot(source)
            .is_some_and(|s| s.dirty_flag().is_time_varying())
        {
            self.time_varying = true;
        }
        Ok(value)
    }

    /// Resolved value of one of the owning instance's inputs.
    pub fn input(&mut self, definition_id: Uuid) -> Result<SlotValue, LibraryError> {
        let slot = self.input_slot(definition_id)?;
        self.pull(slot)
    }

    pub fn input_float(&mut self, definition_id: Uuid) -> Result<f64, LibraryError> {
        let value = self.input(definition_id)?;
        value.get_as::<f64>().ok_or(LibraryError::TypeMismatch {
            expected: ValueType::Float,
            found: value.value_type(),
        })
    }

    pub fn input_int(&mut self, definition_id: Uuid) -> Result<i64, LibraryError> {
        let value = self.input(definition_id)?;
        value.get_as::<i64>().ok_or(LibraryError::TypeMismatch {
            expected: ValueType::Int,
            found: value.value_type(),
        })
    }

    pub fn input_as<T: TryGetValue<T>>(&mut self, definition_id: Uuid) -> Result<T, LibraryError> {
        let value = self.input(definition_id)?;
        value.get_as::<T>().ok_or_else(|| LibraryError::UpdateFailed {
            slot: self.slot,
            message: format!(
                "Input {} holds an unexpected {} value",
                definition_id,
                value.value_type()
            ),
        })
    }

    /// Connected sources of a multi-input, in order, without evaluating them.
    pub fn collected_inputs(&self, definition_id: Uuid) -> Result<Vec<SlotId>, LibraryError> {
        let slot = self.input_slot(definition_id)?;
        self.graph.collected_inputs(slot)
    }

    /// Mark an input clean after consuming its connection list.
    pub fn clear_input_dirty(&mut self, definition_id: Uuid) -> Result<(), LibraryError> {
        let slot = self.input_slot(definition_id)?;
        self.graph.clear_dirty(slot, self.context.frame_id())
    }

    /// Auxiliary data of the slot being recomputed.
    pub fn output_data_mut<T: OutputData>(&mut self) -> Option<&mut T> {
        self.graph
            .slot_mut(self.slot)?
            .output_data
            .as_deref_mut()?
            .downcast_mut::<T>()
    }

    fn input_slot(&self, definition_id: Uuid) -> Result<SlotId, LibraryError> {
        self.graph
            .instance(self.instance)
            .ok_or(LibraryError::InstanceNotFound(self.instance))?
            .input_slot(definition_id)
            .ok_or(LibraryError::DefinitionNotFound(definition_id))
    }
}
