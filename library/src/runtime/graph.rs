//! Arena owning every slot and instance, and the pull evaluator over it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use log::{trace, warn};
use uuid::Uuid;

use super::decorator::SlotDecorator;
use super::dirty_flag::DirtyFlagTrigger;
use super::instance::{Instance, InstanceId};
use super::slot::{Slot, SlotId, SlotInfo, SlotKind};
use crate::config::EngineConfig;
use crate::error::LibraryError;
use crate::evaluation::{EvaluationContext, UpdateAction, UpdateContext};
use crate::model::value::{SlotValue, TryGetValue, ValueType};
use crate::plugin::OperatorRegistry;

/// Owner of all live slots and instances of one evaluation session.
///
/// Handles are plain integers and never reused, so a handle that outlives
/// its slot is detected rather than aliasing a newer one. Structural edits
/// and pulls both take `&mut self` and therefore never overlap.
#[derive(Debug)]
pub struct Graph {
    pub(crate) slots: HashMap<SlotId, Slot>,
    pub(crate) instances: HashMap<InstanceId, Instance>,
    pub(crate) roots: Vec<InstanceId>,
    next_slot: u64,
    next_instance: u64,
    in_progress: HashSet<SlotId>,
    cycle_guard: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            instances: HashMap::new(),
            roots: Vec::new(),
            next_slot: 0,
            next_instance: 0,
            in_progress: HashSet::new(),
            cycle_guard: true,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut graph = Self::new();
        graph.cycle_guard = config.cycle_guard;
        graph
    }

    /// With the guard off, evaluating a cyclic wiring recurses without bound.
    pub fn set_cycle_guard(&mut self, enabled: bool) {
        self.cycle_guard = enabled;
    }

    // -----------------------------------------------------------------------
    // Arena access
    // -----------------------------------------------------------------------

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(&id)
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(&id)
    }

    pub fn contains_slot(&self, id: SlotId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Top-level instances, in creation order.
    pub fn roots(&self) -> &[InstanceId] {
        &self.roots
    }

    pub(crate) fn next_slot_id(&mut self) -> SlotId {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        id
    }

    pub(crate) fn next_instance_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        id
    }

    pub(crate) fn insert_slot(&mut self, slot: Slot) -> SlotId {
        let id = slot.id;
        if let Some(owner) = self.instances.get_mut(&slot.owner) {
            owner.owned_slots.push(id);
        }
        self.slots.insert(id, slot);
        id
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Mark `slot` and everything downstream of it dirty.
    ///
    /// Propagation is eager and walks each slot once, so diamonds and cyclic
    /// wiring terminate. Dependents that no longer exist are skipped.
    pub fn invalidate(&mut self, slot: SlotId) -> Result<(), LibraryError> {
        if !self.slots.contains_key(&slot) {
            return Err(LibraryError::SlotNotFound(slot));
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([slot]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(s) = self.slots.get_mut(&current) {
                s.dirty_flag.invalidate();
                queue.extend(s.dependents.iter().copied());
            }
        }
        trace!("Invalidated {} slot(s) from {}", visited.len(), slot);
        Ok(())
    }

    /// Invalidate everything downstream of `slot`, but not `slot` itself.
    pub(crate) fn invalidate_dependents(&mut self, slot: SlotId) {
        let dependents = match self.slots.get(&slot) {
            Some(s) => s.dependents.clone(),
            None => return,
        };
        for dependent in dependents {
            if !self.slots.contains_key(&dependent) {
                trace!("Skipping stale dependent {} of {}", dependent, slot);
                continue;
            }
            if let Err(err) = self.invalidate(dependent) {
                warn!("Failed to invalidate {}: {}", dependent, err);
            }
        }
    }

    pub fn clear_dirty(&mut self, slot: SlotId, frame_id: u64) -> Result<(), LibraryError> {
        let s = self
            .slots
            .get_mut(&slot)
            .ok_or(LibraryError::SlotNotFound(slot))?;
        let time_varying = s.dirty_flag.is_time_varying();
        s.dirty_flag.clear(frame_id, time_varying);
        Ok(())
    }

    pub fn set_trigger(&mut self, slot: SlotId, trigger: DirtyFlagTrigger) -> Result<(), LibraryError> {
        self.slots
            .get_mut(&slot)
            .ok_or(LibraryError::SlotNotFound(slot))?
            .dirty_flag
            .set_trigger(trigger);
        self.invalidate(slot)
    }

    // -----------------------------------------------------------------------
    // Local input values
    // -----------------------------------------------------------------------

    /// Store a new local value on an input and invalidate it.
    ///
    /// Connected inputs keep their source; the value is used again once the
    /// connection is removed.
    pub fn set_input_value(
        &mut self,
        instance: InstanceId,
        input_definition_id: Uuid,
        value: impl Into<SlotValue>,
    ) -> Result<(), LibraryError> {
        let slot = self.input_slot(instance, input_definition_id)?;
        let value = value.into();
        let s = self
            .slots
            .get_mut(&slot)
            .ok_or(LibraryError::SlotNotFound(slot))?;
        if !s.value_type.accepts(value.value_type()) {
            return Err(LibraryError::TypeMismatch {
                expected: s.value_type,
                found: value.value_type(),
            });
        }
        match &mut s.kind {
            SlotKind::Input { local, .. } => *local = value,
            _ => {
                return Err(LibraryError::runtime(format!(
                    "{} has no local value",
                    slot
                )));
            }
        }
        self.invalidate(slot)
    }

    /// Restore an input's local value from its definition's current default.
    pub fn reset_input(
        &mut self,
        registry: &OperatorRegistry,
        instance: InstanceId,
        input_definition_id: Uuid,
    ) -> Result<(), LibraryError> {
        let symbol_id = self
            .instances
            .get(&instance)
            .ok_or(LibraryError::InstanceNotFound(instance))?
            .symbol_id;
        let default = registry
            .symbol(symbol_id)
            .ok_or(LibraryError::SymbolNotFound(symbol_id))?
            .input_definition(input_definition_id)
            .ok_or(LibraryError::DefinitionNotFound(input_definition_id))?
            .default_value
            .clone();
        self.set_input_value(instance, input_definition_id, default)
    }

    pub fn input_slot(&self, instance: InstanceId, input_definition_id: Uuid) -> Result<SlotId, LibraryError> {
        self.instances
            .get(&instance)
            .ok_or(LibraryError::InstanceNotFound(instance))?
            .input_slot(input_definition_id)
            .ok_or(LibraryError::DefinitionNotFound(input_definition_id))
    }

    pub fn output_slot(&self, instance: InstanceId, output_definition_id: Uuid) -> Result<SlotId, LibraryError> {
        self.instances
            .get(&instance)
            .ok_or(LibraryError::InstanceNotFound(instance))?
            .output_slot(output_definition_id)
            .ok_or(LibraryError::DefinitionNotFound(output_definition_id))
    }

    // -----------------------------------------------------------------------
    // Pull evaluation
    // -----------------------------------------------------------------------

    /// Pull a slot's value, returning the failure of its recompute if any.
    ///
    /// On failure the slot stays dirty and keeps its previous value.
    pub fn try_get_value(&mut self, slot: SlotId, ctx: &EvaluationContext) -> Result<SlotValue, LibraryError> {
        self.evaluate(slot, ctx)
    }

    /// Pull a slot's value, falling back to the last good value on failure.
    ///
    /// Returns the empty value only for an unknown slot.
    pub fn get_value(&mut self, slot: SlotId, ctx: &EvaluationContext) -> SlotValue {
        match self.evaluate(slot, ctx) {
            Ok(value) => value,
            Err(err) => {
                warn!("Pull of {} failed, keeping the last value: {}", slot, err);
                self.slots
                    .get(&slot)
                    .map(|s| s.value.clone())
                    .unwrap_or_default()
            }
        }
    }

    /// Pull a slot's value and extract it as `T`.
    pub fn get_value_as<T: TryGetValue<T>>(&mut self, slot: SlotId, ctx: &EvaluationContext) -> Option<T> {
        self.get_value(slot, ctx).get_as::<T>()
    }

    pub(crate) fn cached_value(&self, slot: SlotId) -> Result<SlotValue, LibraryError> {
        self.slots
            .get(&slot)
            .map(|s| s.value.clone())
            .ok_or(LibraryError::SlotNotFound(slot))
    }

    pub(crate) fn evaluate(&mut self, id: SlotId, ctx: &EvaluationContext) -> Result<SlotValue, LibraryError> {
        let slot = self.slots.get(&id).ok_or(LibraryError::SlotNotFound(id))?;
        if !slot.dirty_flag.needs_update(ctx.frame_id()) {
            return Ok(slot.value.clone());
        }
        let action = slot.chain.active();
        let owner = slot.owner;

        if self.cycle_guard && !self.in_progress.insert(id) {
            return Err(LibraryError::CyclicEvaluation(id));
        }

        let mut update = UpdateContext::new(self, id, owner, ctx);
        let result = action(&mut update);
        let outcome = update.finish();

        if self.cycle_guard {
            self.in_progress.remove(&id);
        }

        let slot = self
            .slots
            .get_mut(&id)
            .ok_or(LibraryError::SlotNotFound(id))?;
        result?;

        if let Some(value) = outcome.pending {
            slot.value = value;
        }
        if !outcome.keep_dirty {
            slot.dirty_flag.clear(ctx.frame_id(), outcome.time_varying);
            slot.update_count += 1;
        }
        trace!("Updated {} for frame {}", id, ctx.frame_id());
        Ok(slot.value.clone())
    }

    /// Connected sources of a multi-input (or single input), in order.
    ///
    /// Sources whose slots no longer exist are skipped with a warning. The
    /// sources are not evaluated.
    pub fn collected_inputs(&self, slot: SlotId) -> Result<Vec<SlotId>, LibraryError> {
        let s = self.slots.get(&slot).ok_or(LibraryError::SlotNotFound(slot))?;
        let sources = s.sources();
        let (live, dangling): (Vec<SlotId>, Vec<SlotId>) =
            sources.into_iter().partition(|id| self.slots.contains_key(id));
        for source in dangling {
            warn!("Skipping dangling source {} of {}", source, slot);
        }
        Ok(live)
    }

    // -----------------------------------------------------------------------
    // Update chains
    // -----------------------------------------------------------------------

    /// Replace the base computation of a slot; decorators stay wrapped around it.
    pub fn set_update_action(&mut self, slot: SlotId, action: UpdateAction) -> Result<(), LibraryError> {
        self.slots
            .get_mut(&slot)
            .ok_or(LibraryError::SlotNotFound(slot))?
            .chain
            .set_base(action);
        self.invalidate(slot)
    }

    /// Wrap a side computation around a slot's current update function.
    pub fn add_decorator(
        &mut self,
        slot: SlotId,
        decorator: impl SlotDecorator + 'static,
    ) -> Result<(), LibraryError> {
        self.slots
            .get_mut(&slot)
            .ok_or(LibraryError::SlotNotFound(slot))?
            .chain
            .push_decorator(Arc::new(decorator));
        self.invalidate(slot)
    }

    pub fn clear_decorators(&mut self, slot: SlotId) -> Result<(), LibraryError> {
        self.slots
            .get_mut(&slot)
            .ok_or(LibraryError::SlotNotFound(slot))?
            .chain
            .clear_decorators();
        self.invalidate(slot)
    }

    /// Disable or re-enable a slot. Either way the slot is invalidated.
    pub fn set_disabled(&mut self, slot: SlotId, disabled: bool) -> Result<(), LibraryError> {
        self.slots
            .get_mut(&slot)
            .ok_or(LibraryError::SlotNotFound(slot))?
            .chain
            .set_disabled(disabled);
        self.invalidate(slot)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Declared inputs and outputs of an instance, in definition order.
    pub fn slot_infos(
        &self,
        registry: &OperatorRegistry,
        instance: InstanceId,
    ) -> Result<(Vec<SlotInfo>, Vec<SlotInfo>), LibraryError> {
        let inst = self
            .instances
            .get(&instance)
            .ok_or(LibraryError::InstanceNotFound(instance))?;
        let symbol = registry
            .symbol(inst.symbol_id)
            .ok_or(LibraryError::SymbolNotFound(inst.symbol_id))?;

        let inputs = symbol
            .input_definitions
            .iter()
            .filter_map(|def| {
                let id = inst.input_slot(def.id)?;
                let slot = self.slots.get(&id)?;
                Some(SlotInfo {
                    id,
                    definition_id: def.id,
                    name: def.name.clone(),
                    value_type: def.value_type,
                    is_multi_input: def.is_multi_input,
                    is_connected: !slot.sources().is_empty(),
                })
            })
            .collect();

        let outputs = symbol
            .output_definitions
            .iter()
            .filter_map(|def| {
                let id = inst.output_slot(def.id)?;
                Some(SlotInfo {
                    id,
                    definition_id: def.id,
                    name: def.name.clone(),
                    value_type: def.value_type,
                    is_multi_input: false,
                    is_connected: !inst.owns(id),
                })
            })
            .collect();

        Ok((inputs, outputs))
    }

    /// Declared type of a slot.
    pub fn slot_type(&self, slot: SlotId) -> Result<ValueType, LibraryError> {
        self.slots
            .get(&slot)
            .map(|s| s.value_type)
            .ok_or(LibraryError::SlotNotFound(slot))
    }
}
