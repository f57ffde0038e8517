//! Operator registration: the registry, plugin traits and built-in operators.

pub mod node_definitions;
pub mod registry;
pub mod traits;

pub use node_definitions::BuiltinOperatorPlugin;
pub use registry::{OperatorBehavior, OperatorFactory, OperatorRegistry};
pub use traits::{OperatorPlugin, Plugin};
