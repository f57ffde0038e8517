//! Instantiation of symbols and resolution of connections into slot wiring.
//!
//! Wiring never evaluates anything: it only rewrites sources and dependents
//! and invalidates what changed.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, trace, warn};
use uuid::Uuid;

use super::decorator::UpdateChain;
use super::dirty_flag::{DirtyFlag, DirtyFlagTrigger};
use super::graph::Graph;
use super::instance::{Instance, InstanceId};
use super::slot::{Slot, SlotId, SlotKind};
use crate::error::LibraryError;
use crate::evaluation::{UpdateAction, UpdateContext};
use crate::model::connection::{Connection, SlotRef};
use crate::model::symbol::Symbol;
use crate::model::symbol_child::SymbolChild;
use crate::model::value::{SlotValue, ValueType};
use crate::plugin::{OperatorBehavior, OperatorRegistry};

/// Base action of single-valued inputs: the connected source, else the local value.
fn resolve_input_action() -> UpdateAction {
    Arc::new(|update: &mut UpdateContext<'_>| {
        let slot = update.slot_id();
        let (local, source) = match update.graph().slot(slot).map(|s| s.kind()) {
            Some(SlotKind::Input { local, source }) => (local.clone(), *source),
            _ => return Err(LibraryError::runtime(format!("{} is not an input", slot))),
        };
        let value = match source {
            Some(source) if update.graph().contains_slot(source) => update.pull(source)?,
            Some(source) => {
                warn!(
                    "Source {} of {} no longer exists, using the local value",
                    source, slot
                );
                local
            }
            None => local,
        };
        update.set_value(value);
        Ok(())
    })
}

/// Base action of multi-inputs: the values of every live source, in order.
fn collect_multi_input_action() -> UpdateAction {
    Arc::new(|update: &mut UpdateContext<'_>| {
        let sources = update.graph().collected_inputs(update.slot_id())?;
        let mut values = Vec::with_capacity(sources.len());
        for source in sources {
            values.push(update.pull(source)?);
        }
        update.set_value(SlotValue::List(values));
        Ok(())
    })
}

impl Graph {
    /// Instantiate `symbol_id` as a new top-level instance.
    pub fn instantiate_root(
        &mut self,
        registry: &OperatorRegistry,
        symbol_id: Uuid,
    ) -> Result<InstanceId, LibraryError> {
        let symbol = registry
            .symbol(symbol_id)
            .ok_or(LibraryError::SymbolNotFound(symbol_id))?;
        let child = SymbolChild::new(symbol, Uuid::new_v4());
        let id = self.instantiate(registry, &child, None)?;
        self.roots.push(id);
        debug!("Instantiated root {} of symbol {}", id, symbol.name);
        Ok(id)
    }

    /// Instantiate a symbol child below `parent`.
    pub fn add_child(
        &mut self,
        registry: &OperatorRegistry,
        parent: InstanceId,
        child: &SymbolChild,
    ) -> Result<InstanceId, LibraryError> {
        let parent_instance = self
            .instances
            .get(&parent)
            .ok_or(LibraryError::InstanceNotFound(parent))?;
        if !parent_instance.is_composite {
            return Err(LibraryError::runtime(format!(
                "{} is not a composite and cannot hold children",
                parent
            )));
        }
        if parent_instance.child(child.id).is_some() {
            return Err(LibraryError::DuplicateId(child.id));
        }

        let id = self.instantiate(registry, child, Some(parent))?;
        if let Some(parent_instance) = self.instances.get_mut(&parent) {
            parent_instance.children.push((child.id, id));
        }
        debug!("Added child {} ({}) to {}", child.id, id, parent);
        Ok(id)
    }

    /// Remove the child instance realizing symbol child `child_id`.
    pub fn remove_child(&mut self, parent: InstanceId, child_id: Uuid) -> Result<(), LibraryError> {
        let parent_instance = self
            .instances
            .get(&parent)
            .ok_or(LibraryError::InstanceNotFound(parent))?;
        let child = parent_instance
            .child(child_id)
            .ok_or(LibraryError::ChildNotFound {
                symbol: parent_instance.symbol_id,
                child: child_id,
            })?;
        self.remove_instance(child)
    }

    /// Tear down an instance and everything it owns.
    ///
    /// Downstream slots are invalidated first. Connections that referenced the
    /// removed slots are left in place: inputs fed by them fall back to their
    /// local values until the connection is removed.
    pub fn remove_instance(&mut self, id: InstanceId) -> Result<(), LibraryError> {
        let parent = self
            .instances
            .get(&id)
            .ok_or(LibraryError::InstanceNotFound(id))?
            .parent;

        let mut subtree = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(instance) = self.instances.get(&current) {
                stack.extend(instance.children());
                subtree.push(current);
            }
        }

        let removed_slots: HashSet<SlotId> = subtree
            .iter()
            .filter_map(|i| self.instances.get(i))
            .flat_map(|i| i.owned_slots.iter().copied())
            .collect();

        for slot in &removed_slots {
            self.invalidate_dependents(*slot);
        }
        for slot in &removed_slots {
            self.slots.remove(slot);
        }
        for instance in &subtree {
            self.instances.remove(instance);
        }
        for slot in self.slots.values_mut() {
            slot.dependents.retain(|d| !removed_slots.contains(d));
        }

        match parent {
            Some(parent) => {
                if let Some(parent) = self.instances.get_mut(&parent) {
                    parent.children.retain(|(_, child)| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
        debug!(
            "Removed {} ({} instance(s), {} slot(s))",
            id,
            subtree.len(),
            removed_slots.len()
        );
        Ok(())
    }

    /// Wire a connection of `parent`'s symbol into the live slots.
    pub fn add_connection(&mut self, parent: InstanceId, conn: &Connection) -> Result<(), LibraryError> {
        self.wire(parent, conn, conn.multi_input_index)?;
        debug!(
            "Connected {}.{} -> {}.{} in {}",
            conn.source.child_id, conn.source.slot_id, conn.target.child_id, conn.target.slot_id, parent
        );
        Ok(())
    }

    /// Undo the wiring of a connection. Works for dangling sources too.
    pub fn remove_connection(&mut self, parent: InstanceId, conn: &Connection) -> Result<(), LibraryError> {
        if conn.target.is_boundary() {
            let current = self.output_slot(parent, conn.target.slot_id)?;
            let is_placeholder = self
                .slots
                .get(&current)
                .is_some_and(|s| s.owner == parent && matches!(s.kind, SlotKind::Output));
            if is_placeholder {
                trace!("{} already exposes a placeholder for {}", parent, conn.target.slot_id);
                return Ok(());
            }
            let value_type = self.slot_type(current).unwrap_or(ValueType::Any);
            let placeholder = self.placeholder_output(parent, conn.target.slot_id, value_type);
            if let Some(instance) = self.instances.get_mut(&parent) {
                instance.set_output(conn.target.slot_id, placeholder);
            }
            return Ok(());
        }

        let source = self.resolve_source(parent, &conn.source).ok();
        let target = self.resolve_child_input(parent, &conn.target)?;
        // Without a live source, the entry to drop is one whose slot is gone.
        let dangling: HashSet<SlotId> = self
            .slots
            .get(&target)
            .map(|s| s.sources())
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !self.slots.contains_key(s))
            .collect();
        let slot = self
            .slots
            .get_mut(&target)
            .ok_or(LibraryError::SlotNotFound(target))?;

        let detached = match &mut slot.kind {
            SlotKind::Input { source: current, .. } => current.take(),
            SlotKind::MultiInput { sources } => {
                let is_match = |candidate: &SlotId| match source {
                    Some(source) => *candidate == source,
                    None => dangling.contains(candidate),
                };
                let position = conn
                    .multi_input_index
                    .filter(|i| sources.get(*i).is_some_and(|s| is_match(s)))
                    .or_else(|| sources.iter().position(|s| is_match(s)));
                position.map(|i| sources.remove(i))
            }
            _ => return Err(LibraryError::invalid_connection(format!("{} is not an input", target))),
        };
        let still_fed = slot.sources().iter().any(|s| Some(*s) == detached);

        if let Some(detached) = detached {
            if !still_fed {
                if let Some(source) = self.slots.get_mut(&detached) {
                    source.remove_dependent(target);
                }
            }
            debug!("Disconnected {} from {}", detached, target);
        } else {
            warn!("No wiring found for connection into {}", target);
        }
        self.invalidate(target)
    }

    pub(crate) fn instantiate(
        &mut self,
        registry: &OperatorRegistry,
        child: &SymbolChild,
        parent: Option<InstanceId>,
    ) -> Result<InstanceId, LibraryError> {
        let symbol = registry
            .symbol(child.symbol_id)
            .ok_or(LibraryError::SymbolNotFound(child.symbol_id))?;
        let factory = registry.factory(symbol.id);

        let id = self.next_instance_id();
        self.instances.insert(
            id,
            Instance::new(
                id,
                symbol.id,
                child.id,
                child.readable_name(symbol),
                parent,
                factory.is_none(),
            ),
        );

        for def in &symbol.input_definitions {
            let (kind, value, action) = if def.is_multi_input {
                (
                    SlotKind::MultiInput { sources: Vec::new() },
                    SlotValue::List(Vec::new()),
                    collect_multi_input_action(),
                )
            } else {
                let local = child
                    .input(def.id)
                    .map(|input| input.value.clone())
                    .unwrap_or_else(|| def.default_value.clone());
                (
                    SlotKind::Input {
                        local: local.clone(),
                        source: None,
                    },
                    local,
                    resolve_input_action(),
                )
            };
            let slot_id = self.next_slot_id();
            self.insert_slot(Slot::new(
                slot_id,
                id,
                def.id,
                def.value_type,
                kind,
                value,
                UpdateChain::new(action),
            ));
            if let Some(instance) = self.instances.get_mut(&id) {
                instance.inputs.push((def.id, slot_id));
            }
        }

        let built = match factory {
            Some(factory) => {
                self.build_operator_outputs(symbol, child, id, factory());
                Ok(())
            }
            None => self.build_composite(registry, symbol, id),
        };
        if let Err(err) = built {
            let _ = self.remove_instance(id);
            return Err(err);
        }
        Ok(id)
    }

    fn build_operator_outputs(
        &mut self,
        symbol: &Symbol,
        child: &SymbolChild,
        id: InstanceId,
        behavior: OperatorBehavior,
    ) {
        let input_slots: Vec<SlotId> = self
            .instances
            .get(&id)
            .map(|i| i.inputs.iter().map(|(_, slot)| *slot).collect())
            .unwrap_or_default();

        for def in &symbol.output_definitions {
            let chain = match behavior.action(def.id) {
                Some(action) => UpdateChain::new(action),
                None => {
                    warn!("Operator {} has no update for output {}", symbol.name, def.name);
                    UpdateChain::noop()
                }
            };
            let trigger = child
                .outputs
                .get(&def.id)
                .map(|o| o.dirty_flag_trigger)
                .filter(|t| *t != DirtyFlagTrigger::None)
                .unwrap_or(def.dirty_flag_trigger);

            let slot_id = self.next_slot_id();
            let mut slot = Slot::new(
                slot_id,
                id,
                def.id,
                def.value_type,
                SlotKind::Output,
                def.value_type.default_value(),
                chain,
            );
            slot.dirty_flag = DirtyFlag::new(trigger);
            slot.output_data = def.output_data.map(|factory| factory());
            self.insert_slot(slot);

            for input in &input_slots {
                if let Some(input) = self.slots.get_mut(input) {
                    input.add_dependent(slot_id);
                }
            }
            if let Some(instance) = self.instances.get_mut(&id) {
                instance.outputs.push((def.id, slot_id));
            }
        }
    }

    fn build_composite(
        &mut self,
        registry: &OperatorRegistry,
        symbol: &Symbol,
        id: InstanceId,
    ) -> Result<(), LibraryError> {
        for child in &symbol.children {
            let child_instance = self.instantiate(registry, child, Some(id))?;
            if let Some(instance) = self.instances.get_mut(&id) {
                instance.children.push((child.id, child_instance));
            }
        }

        // Stored connections are already in multi-input order.
        for conn in &symbol.connections {
            self.wire(id, conn, None)?;
        }

        for def in &symbol.output_definitions {
            let aliased = self
                .instances
                .get(&id)
                .is_some_and(|i| i.output_slot(def.id).is_some());
            if !aliased {
                let placeholder = self.placeholder_output(id, def.id, def.value_type);
                if let Some(instance) = self.instances.get_mut(&id) {
                    instance.set_output(def.id, placeholder);
                }
            }
        }

        if let Some(instance) = self.instances.get_mut(&id) {
            instance.outputs.sort_by_key(|(def, _)| {
                symbol
                    .output_definitions
                    .iter()
                    .position(|d| d.id == *def)
            });
        }
        Ok(())
    }

    fn wire(
        &mut self,
        parent: InstanceId,
        conn: &Connection,
        multi_input_index: Option<usize>,
    ) -> Result<(), LibraryError> {
        let source = self.resolve_source(parent, &conn.source)?;

        if conn.target.is_boundary() {
            // The composite exposes the source slot itself as its output.
            let instance = self
                .instances
                .get_mut(&parent)
                .ok_or(LibraryError::InstanceNotFound(parent))?;
            instance.set_output(conn.target.slot_id, source);
            return Ok(());
        }

        let target = self.resolve_child_input(parent, &conn.target)?;
        self.connect_slots(source, target, multi_input_index)
    }

    /// Point `target` at `source` and register it as a dependent.
    pub(crate) fn connect_slots(
        &mut self,
        source: SlotId,
        target: SlotId,
        multi_input_index: Option<usize>,
    ) -> Result<(), LibraryError> {
        if !self.slots.contains_key(&source) {
            return Err(LibraryError::SlotNotFound(source));
        }
        let slot = self
            .slots
            .get_mut(&target)
            .ok_or(LibraryError::SlotNotFound(target))?;

        let replaced = match &mut slot.kind {
            SlotKind::Input { source: current, .. } => current.replace(source),
            SlotKind::MultiInput { sources } => {
                match multi_input_index {
                    Some(index) => sources.insert(index.min(sources.len()), source),
                    None => sources.push(source),
                }
                None
            }
            _ => {
                return Err(LibraryError::invalid_connection(format!(
                    "{} is not an input",
                    target
                )));
            }
        };

        if let Some(previous) = replaced.filter(|p| *p != source) {
            if let Some(previous) = self.slots.get_mut(&previous) {
                previous.remove_dependent(target);
            }
        }
        if let Some(source) = self.slots.get_mut(&source) {
            source.add_dependent(target);
        }
        self.invalidate(target)
    }

    fn resolve_source(&self, parent: InstanceId, slot: &SlotRef) -> Result<SlotId, LibraryError> {
        if slot.is_boundary() {
            return self.input_slot(parent, slot.slot_id);
        }
        let child = self.child_instance(parent, slot.child_id)?;
        self.output_slot(child, slot.slot_id)
    }

    fn resolve_child_input(&self, parent: InstanceId, slot: &SlotRef) -> Result<SlotId, LibraryError> {
        let child = self.child_instance(parent, slot.child_id)?;
        self.input_slot(child, slot.slot_id)
    }

    fn child_instance(&self, parent: InstanceId, child_id: Uuid) -> Result<InstanceId, LibraryError> {
        let instance = self
            .instances
            .get(&parent)
            .ok_or(LibraryError::InstanceNotFound(parent))?;
        instance.child(child_id).ok_or(LibraryError::ChildNotFound {
            symbol: instance.symbol_id,
            child: child_id,
        })
    }

    /// Output slot for a composite output nothing is connected to yet.
    fn placeholder_output(&mut self, owner: InstanceId, definition_id: Uuid, value_type: ValueType) -> SlotId {
        let slot_id = self.next_slot_id();
        self.insert_slot(Slot::new(
            slot_id,
            owner,
            definition_id,
            value_type,
            SlotKind::Output,
            value_type.default_value(),
            UpdateChain::noop(),
        ))
    }
}
