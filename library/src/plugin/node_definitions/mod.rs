//! Built-in operator types.
//!
//! Each operator is declared statically: its symbol (inputs, outputs,
//! defaults) and a factory producing the update functions of one instance.

pub mod color;
pub mod data;
pub mod math;
pub mod time;

use uuid::Uuid;

use crate::error::LibraryError;
use crate::model::symbol::{InputDefinition, OutputDefinition, Symbol, SymbolCategory};
use crate::model::value::{SlotValue, ValueType};
use crate::plugin::OperatorRegistry;
use crate::plugin::traits::{OperatorPlugin, Plugin};

/// Registers every built-in operator.
pub struct BuiltinOperatorPlugin;

impl Plugin for BuiltinOperatorPlugin {
    fn id(&self) -> &'static str {
        "builtin_operators"
    }

    fn name(&self) -> String {
        "Built-in Operators".to_string()
    }

    fn category(&self) -> String {
        "Operator".to_string()
    }

    fn version(&self) -> (u32, u32, u32) {
        (0, 1, 0)
    }
}

impl OperatorPlugin for BuiltinOperatorPlugin {
    fn register_operators(&self, registry: &mut OperatorRegistry) -> Result<(), LibraryError> {
        math::register(registry)?;
        data::register(registry)?;
        color::register(registry)?;
        time::register(registry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Definition helpers
// ---------------------------------------------------------------------------

fn inp(id: Uuid, name: &str, default: impl Into<SlotValue>) -> InputDefinition {
    InputDefinition::new(id, name, default)
}

fn multi(id: Uuid, name: &str, value_type: ValueType) -> InputDefinition {
    InputDefinition::multi(id, name, value_type)
}

fn out(id: Uuid, name: &str, value_type: ValueType) -> OutputDefinition {
    OutputDefinition::new(id, name, value_type)
}

fn node(id: Uuid, name: &str, category: SymbolCategory) -> Symbol {
    Symbol::new(id, name, category)
}
