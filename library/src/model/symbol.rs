//! Symbol definitions: the declarative type of an operator.

use std::fmt;

use uuid::Uuid;

use super::connection::Connection;
use super::output_data::OutputDataFactory;
use super::symbol_child::SymbolChild;
use super::value::{SlotValue, ValueType};
use crate::runtime::DirtyFlagTrigger;

/// Category of a symbol, used for grouping in browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    /// Arithmetic on scalars
    Math,
    /// Value sources, selection and recording
    Data,
    /// Color and gradient operations
    Color,
    /// Time sources
    Time,
    /// User-built sub-graphs
    Composite,
    /// Plugin-defined custom category
    Custom,
}

impl fmt::Display for SymbolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolCategory::Math => "Math",
            SymbolCategory::Data => "Data",
            SymbolCategory::Color => "Color",
            SymbolCategory::Time => "Time",
            SymbolCategory::Composite => "Composite",
            SymbolCategory::Custom => "Custom",
        };
        write!(f, "{}", s)
    }
}

/// One declared input of a symbol.
#[derive(Debug, Clone)]
pub struct InputDefinition {
    pub id: Uuid,
    pub name: String,
    pub value_type: ValueType,
    /// Shared default, cloned into every symbol child
    pub default_value: SlotValue,
    /// Accepts any number of ordered connections
    pub is_multi_input: bool,
}

impl InputDefinition {
    /// Single-valued input; the declared type is taken from the default.
    pub fn new(id: Uuid, name: &str, default_value: impl Into<SlotValue>) -> Self {
        let default_value = default_value.into();
        Self {
            id,
            name: name.to_string(),
            value_type: default_value.value_type(),
            default_value,
            is_multi_input: false,
        }
    }

    /// Multi-valued input collecting any number of sources of `value_type`.
    pub fn multi(id: Uuid, name: &str, value_type: ValueType) -> Self {
        Self {
            id,
            name: name.to_string(),
            value_type,
            default_value: SlotValue::List(Vec::new()),
            is_multi_input: true,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

/// One declared output of a symbol.
#[derive(Debug, Clone)]
pub struct OutputDefinition {
    pub id: Uuid,
    pub name: String,
    pub value_type: ValueType,
    /// Creates the auxiliary side-channel object for each output
    pub output_data: Option<OutputDataFactory>,
    pub dirty_flag_trigger: DirtyFlagTrigger,
}

impl OutputDefinition {
    pub fn new(id: Uuid, name: &str, value_type: ValueType) -> Self {
        Self {
            id,
            name: name.to_string(),
            value_type,
            output_data: None,
            dirty_flag_trigger: DirtyFlagTrigger::None,
        }
    }

    pub fn with_output_data(mut self, factory: OutputDataFactory) -> Self {
        self.output_data = Some(factory);
        self
    }

    pub fn with_trigger(mut self, trigger: DirtyFlagTrigger) -> Self {
        self.dirty_flag_trigger = trigger;
        self
    }
}

/// Declarative operator type.
///
/// Atomic symbols are paired with an operator factory in the registry. Composite
/// symbols have no factory; their behaviour comes from `children` wired by
/// `connections`.
#[derive(Debug)]
pub struct Symbol {
    pub id: Uuid,
    /// Unique registry name (e.g. "math.add")
    pub name: String,
    pub category: SymbolCategory,
    pub description: String,
    pub input_definitions: Vec<InputDefinition>,
    pub output_definitions: Vec<OutputDefinition>,
    pub children: Vec<SymbolChild>,
    pub connections: Vec<Connection>,
}

impl Symbol {
    pub fn new(id: Uuid, name: &str, category: SymbolCategory) -> Self {
        Self {
            id,
            name: name.to_string(),
            category,
            description: String::new(),
            input_definitions: Vec::new(),
            output_definitions: Vec::new(),
            children: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<InputDefinition>) -> Self {
        self.input_definitions = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<OutputDefinition>) -> Self {
        self.output_definitions = outputs;
        self
    }

    pub fn input_definition(&self, id: Uuid) -> Option<&InputDefinition> {
        self.input_definitions.iter().find(|d| d.id == id)
    }

    pub fn input_definition_mut(&mut self, id: Uuid) -> Option<&mut InputDefinition> {
        self.input_definitions.iter_mut().find(|d| d.id == id)
    }

    pub fn output_definition(&self, id: Uuid) -> Option<&OutputDefinition> {
        self.output_definitions.iter().find(|d| d.id == id)
    }

    pub fn is_composite(&self) -> bool {
        self.category == SymbolCategory::Composite
    }

    pub fn child(&self, id: Uuid) -> Option<&SymbolChild> {
        self.children.iter().find(|c| c.id == id)
    }

    pub fn child_mut(&mut self, id: Uuid) -> Option<&mut SymbolChild> {
        self.children.iter_mut().find(|c| c.id == id)
    }

    /// Connections feeding a target slot, in multi-input order.
    pub fn connections_to(&self, target_child: Uuid, target_slot: Uuid) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.target.child_id == target_child && c.target.slot_id == target_slot)
            .collect()
    }
}
