//! Live evaluation state: slots, instances and the graph arena that owns them.

mod animator;
pub mod decorator;
pub mod dirty_flag;
mod graph;
pub mod instance;
pub mod slot;
mod wiring;

pub use decorator::{SlotDecorator, TransformCallback, UpdateChain};
pub use dirty_flag::{DirtyFlag, DirtyFlagTrigger};
pub use graph::Graph;
pub use instance::{Instance, InstanceId};
pub use slot::{Slot, SlotId, SlotInfo, SlotKind};
