//! A symbol placed inside a parent graph, with its own input values.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::output_data::OutputData;
use super::symbol::{InputDefinition, Symbol};
use super::value::SlotValue;
use crate::error::LibraryError;
use crate::runtime::DirtyFlagTrigger;

/// Per-child value of one input definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub definition_id: Uuid,
    /// Independent clone of the definition's default
    pub value: SlotValue,
    /// Set when the value was last assigned from (or to) the default
    pub is_default: bool,
}

impl Input {
    pub fn new(definition: &InputDefinition) -> Self {
        Self {
            definition_id: definition.id,
            value: definition.default_value.clone(),
            is_default: true,
        }
    }

    pub fn set_value(&mut self, value: SlotValue) {
        self.value = value;
        self.is_default = false;
    }

    /// Write this child's value back into the shared definition.
    pub fn set_current_value_as_default(&mut self, definition: &mut InputDefinition) {
        definition.default_value = self.value.clone();
        self.is_default = true;
    }

    pub fn reset_to_default(&mut self, definition: &InputDefinition) {
        self.value = definition.default_value.clone();
        self.is_default = true;
    }
}

/// Per-child metadata of one output definition.
#[derive(Debug)]
pub struct Output {
    pub definition_id: Uuid,
    pub output_data: Option<Box<dyn OutputData>>,
    pub dirty_flag_trigger: DirtyFlagTrigger,
}

#[derive(Debug)]
pub struct SymbolChild {
    /// Unique within the parent symbol
    pub id: Uuid,
    pub symbol_id: Uuid,
    pub name: String,
    pub inputs: HashMap<Uuid, Input>,
    pub outputs: HashMap<Uuid, Output>,
}

impl SymbolChild {
    pub fn new(symbol: &Symbol, id: Uuid) -> Self {
        let inputs = symbol
            .input_definitions
            .iter()
            .map(|def| (def.id, Input::new(def)))
            .collect();

        let outputs = symbol
            .output_definitions
            .iter()
            .map(|def| {
                let output = Output {
                    definition_id: def.id,
                    output_data: def.output_data.map(|factory| factory()),
                    dirty_flag_trigger: DirtyFlagTrigger::None,
                };
                (def.id, output)
            })
            .collect();

        Self {
            id,
            symbol_id: symbol.id,
            name: String::new(),
            inputs,
            outputs,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn readable_name<'a>(&'a self, symbol: &'a Symbol) -> &'a str {
        if self.name.is_empty() {
            &symbol.name
        } else {
            &self.name
        }
    }

    pub fn input(&self, definition_id: Uuid) -> Option<&Input> {
        self.inputs.get(&definition_id)
    }

    pub fn input_mut(&mut self, definition_id: Uuid) -> Option<&mut Input> {
        self.inputs.get_mut(&definition_id)
    }

    pub fn set_input_value(
        &mut self,
        definition_id: Uuid,
        value: impl Into<SlotValue>,
    ) -> Result<(), LibraryError> {
        let input = self
            .inputs
            .get_mut(&definition_id)
            .ok_or(LibraryError::DefinitionNotFound(definition_id))?;
        input.set_value(value.into());
        Ok(())
    }

    /// Read-only copy of the persisted state, sorted by definition id.
    pub fn snapshot(&self) -> SymbolChildSnapshot {
        let mut inputs: Vec<InputSnapshot> = self
            .inputs
            .values()
            .map(|input| InputSnapshot {
                id: input.definition_id,
                value: input.value.clone(),
                is_default: input.is_default,
            })
            .collect();
        inputs.sort_by_key(|i| i.id);

        let mut output_triggers: Vec<(Uuid, DirtyFlagTrigger)> = self
            .outputs
            .values()
            .map(|o| (o.definition_id, o.dirty_flag_trigger))
            .collect();
        output_triggers.sort_by_key(|(id, _)| *id);

        SymbolChildSnapshot {
            id: self.id,
            symbol_id: self.symbol_id,
            name: self.name.clone(),
            inputs,
            output_triggers,
        }
    }

    /// Assign persisted values as-is, bypassing the default-clone path.
    ///
    /// Inputs whose definition no longer exists are skipped.
    pub fn restore(&mut self, snapshot: &SymbolChildSnapshot) -> Result<(), LibraryError> {
        if snapshot.symbol_id != self.symbol_id {
            return Err(LibraryError::runtime(format!(
                "Snapshot of symbol {} cannot restore a child of symbol {}",
                snapshot.symbol_id, self.symbol_id
            )));
        }
        self.name = snapshot.name.clone();

        for stored in &snapshot.inputs {
            match self.inputs.get_mut(&stored.id) {
                Some(input) => {
                    input.value = stored.value.clone();
                    input.is_default = stored.is_default;
                }
                None => warn!(
                    "Skipping stored input {} of child {}: definition no longer exists",
                    stored.id, self.id
                ),
            }
        }

        for (id, trigger) in &snapshot.output_triggers {
            if let Some(output) = self.outputs.get_mut(id) {
                output.dirty_flag_trigger = *trigger;
            }
        }
        Ok(())
    }

    pub fn from_snapshot(symbol: &Symbol, snapshot: &SymbolChildSnapshot) -> Result<Self, LibraryError> {
        let mut child = SymbolChild::new(symbol, snapshot.id);
        child.restore(snapshot)?;
        Ok(child)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InputSnapshot {
    pub id: Uuid,
    pub value: SlotValue,
    pub is_default: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SymbolChildSnapshot {
    pub id: Uuid,
    pub symbol_id: Uuid,
    #[serde(default)]
    pub name: String,
    pub inputs: Vec<InputSnapshot>,
    #[serde(default)]
    pub output_triggers: Vec<(Uuid, DirtyFlagTrigger)>,
}
