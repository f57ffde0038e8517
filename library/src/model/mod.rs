pub mod connection;
pub mod gradient;
pub mod graph_analysis;
pub mod output_data;
pub mod symbol;
pub mod symbol_child;
pub mod value;

pub use connection::{Connection, SlotRef};
pub use gradient::{Gradient, GradientStep, Interpolation};
pub use output_data::{OutputData, OutputDataFactory, RecordedValues};
pub use symbol::{InputDefinition, OutputDefinition, Symbol, SymbolCategory};
pub use symbol_child::{Input, InputSnapshot, Output, SymbolChild, SymbolChildSnapshot};
pub use value::{SlotValue, TryGetValue, ValueType, Vec2, Vec3, Vec4};
