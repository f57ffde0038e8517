use uuid::Uuid;

use super::{inp, node, out};
use crate::error::LibraryError;
use crate::model::symbol::SymbolCategory;
use crate::model::value::ValueType;
use crate::plugin::{OperatorBehavior, OperatorRegistry};
use crate::runtime::DirtyFlagTrigger;

pub const CLOCK_ID: Uuid = Uuid::from_u128(0xa19b8916_672c_436b_8058_7d1cfb948a68);
pub const CLOCK_SPEED: Uuid = Uuid::from_u128(0x9ee33829_397c_4d94_9c6f_d486dc2a0025);
pub const CLOCK_OFFSET: Uuid = Uuid::from_u128(0x990052d7_5eb1_47c0_8188_8cb6cc4607be);
pub const CLOCK_TIME: Uuid = Uuid::from_u128(0x746bdb7f_9bd5_41be_8519_d3895c844a34);

pub(super) fn register(registry: &mut OperatorRegistry) -> Result<(), LibraryError> {
    registry.register_operator(
        node(CLOCK_ID, "time.clock", SymbolCategory::Time)
            .with_description("Local time scaled by Speed and shifted by Offset")
            .with_inputs(vec![inp(CLOCK_SPEED, "Speed", 1.0), inp(CLOCK_OFFSET, "Offset", 0.0)])
            .with_outputs(vec![
                out(CLOCK_TIME, "Time", ValueType::Float).with_trigger(DirtyFlagTrigger::Animated),
            ]),
        || {
            OperatorBehavior::new().with_output(CLOCK_TIME, |update| {
                let speed = update.input_float(CLOCK_SPEED)?;
                let offset = update.input_float(CLOCK_OFFSET)?;
                update.set_value(update.local_time() * speed + offset);
                Ok(())
            })
        },
    )
}
