//! Driving float inputs from keyframed curves.

use std::sync::Arc;

use log::debug;
use uuid::Uuid;

use super::decorator::UpdateChain;
use super::dirty_flag::{DirtyFlag, DirtyFlagTrigger};
use super::graph::Graph;
use super::instance::InstanceId;
use super::slot::{Slot, SlotId, SlotKind};
use crate::animation::Curve;
use crate::error::LibraryError;
use crate::evaluation::{UpdateAction, UpdateContext};
use crate::model::value::{SlotValue, ValueType};

impl Graph {
    /// Animate a float input with `curve`.
    ///
    /// A curve slot owned by the instance samples the curve at the local time
    /// of every pull and becomes the input's source. Animating an already
    /// animated input replaces the curve.
    pub fn animate_input(
        &mut self,
        instance: InstanceId,
        input_definition_id: Uuid,
        curve: Curve,
    ) -> Result<SlotId, LibraryError> {
        let input = self.input_slot(instance, input_definition_id)?;
        let input_type = self.slot_type(input)?;
        let is_single = self
            .slot(input)
            .is_some_and(|s| matches!(s.kind(), SlotKind::Input { .. }));
        if input_type != ValueType::Float || !is_single {
            return Err(LibraryError::TypeMismatch {
                expected: ValueType::Float,
                found: input_type,
            });
        }

        if self.slot(input).is_some_and(|s| !s.sources().is_empty())
            && self
                .instance(instance)
                .and_then(|i| i.animation(input_definition_id))
                .is_none()
        {
            return Err(LibraryError::invalid_connection(format!(
                "Input {} is connected and cannot be animated",
                input_definition_id
            )));
        }

        if let Some(previous) = self
            .instance(instance)
            .and_then(|i| i.animation(input_definition_id))
        {
            let action = curve_action(curve);
            return self.set_update_action(previous, action).map(|_| previous);
        }

        let slot_id = self.next_slot_id();
        let mut slot = Slot::new(
            slot_id,
            instance,
            Uuid::nil(),
            ValueType::Float,
            SlotKind::Curve,
            SlotValue::from(0.0),
            UpdateChain::new(curve_action(curve)),
        );
        slot.dirty_flag = DirtyFlag::new(DirtyFlagTrigger::Animated);
        self.insert_slot(slot);
        if let Some(inst) = self.instance_mut(instance) {
            inst.animations.insert(input_definition_id, slot_id);
        }
        self.connect_slots(slot_id, input, None)?;
        debug!("Animated input {} of {}", input_definition_id, instance);
        Ok(slot_id)
    }

    /// Stop animating an input; it goes back to its local value.
    pub fn remove_animation(&mut self, instance: InstanceId, input_definition_id: Uuid) -> Result<(), LibraryError> {
        let input = self.input_slot(instance, input_definition_id)?;
        let curve_slot = self
            .instance_mut(instance)
            .ok_or(LibraryError::InstanceNotFound(instance))?
            .animations
            .remove(&input_definition_id)
            .ok_or(LibraryError::DefinitionNotFound(input_definition_id))?;

        if let Some(slot) = self.slot_mut(input) {
            if let SlotKind::Input { source, .. } = &mut slot.kind {
                if *source == Some(curve_slot) {
                    *source = None;
                }
            }
        }
        self.slots.remove(&curve_slot);
        if let Some(inst) = self.instance_mut(instance) {
            inst.owned_slots.retain(|s| *s != curve_slot);
        }
        debug!("Removed animation of input {} of {}", input_definition_id, instance);
        self.invalidate(input)
    }
}

fn curve_action(curve: Curve) -> UpdateAction {
    Arc::new(move |update: &mut UpdateContext<'_>| {
        let value = curve.sample(update.local_time());
        update.set_value(value);
        Ok(())
    })
}
