//! Core plugin traits.

use crate::error::LibraryError;
use crate::plugin::OperatorRegistry;

/// Base trait for all plugins.
pub trait Plugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> String;
    fn category(&self) -> String;
    fn version(&self) -> (u32, u32, u32);
    fn impl_type(&self) -> String {
        "Native".to_string()
    }
}

/// Plugin contributing operator types (symbols and their factories).
pub trait OperatorPlugin: Plugin {
    fn register_operators(&self, registry: &mut OperatorRegistry) -> Result<(), LibraryError>;
}
