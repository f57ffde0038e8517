use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use super::{inp, multi, node, out};
use crate::error::LibraryError;
use crate::model::output_data::RecordedValues;
use crate::model::symbol::SymbolCategory;
use crate::model::value::ValueType;
use crate::plugin::{OperatorBehavior, OperatorRegistry};

pub const FLOAT_VALUE_ID: Uuid = Uuid::from_u128(0x07e7bf59_65a4_49fb_92da_544a955a52df);
pub const FLOAT_VALUE_INPUT: Uuid = Uuid::from_u128(0xa64d30e0_b90d_489c_b098_7e676d8934c2);
pub const FLOAT_VALUE_RESULT: Uuid = Uuid::from_u128(0xddfaa62a_61a3_4e6e_b1bf_3851eb029e3b);

pub const PICK_FLOAT_ID: Uuid = Uuid::from_u128(0x31828d7a_8b05_4472_b167_82362731b1b6);
pub const PICK_FLOAT_VALUES: Uuid = Uuid::from_u128(0xd7ef7f1a_a6bd_4f94_a29a_bb19e2854001);
pub const PICK_FLOAT_INDEX: Uuid = Uuid::from_u128(0x465b4fc3_899c_4b97_9892_f237fa6613e8);
pub const PICK_FLOAT_SELECTED: Uuid = Uuid::from_u128(0x72add436_84aa_4332_b061_be8d50981c77);

pub const VALUE_RECORDER_ID: Uuid = Uuid::from_u128(0xb419743f_c525_4a8f_b368_416813a4741f);
pub const VALUE_RECORDER_INPUT: Uuid = Uuid::from_u128(0x23be6e6a_ce74_48dc_bad7_f97f4bf97b4a);
pub const VALUE_RECORDER_RESULT: Uuid = Uuid::from_u128(0xd9bf436a_89a0_4da6_8bcd_d75a58b20468);

/// Position in a list of `len` entries selected by `index`.
///
/// Negative and overflowing indices wrap around, so every index is valid for a
/// non-empty list.
pub fn wrap_index(index: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(index.rem_euclid(len as i64) as usize)
}

pub(super) fn register(registry: &mut OperatorRegistry) -> Result<(), LibraryError> {
    use ValueType::*;
    let nc = SymbolCategory::Data;

    registry.register_operator(
        node(FLOAT_VALUE_ID, "data.float_value", nc)
            .with_inputs(vec![inp(FLOAT_VALUE_INPUT, "Float", 0.0)])
            .with_outputs(vec![out(FLOAT_VALUE_RESULT, "Result", Float)]),
        || {
            OperatorBehavior::new().with_output(FLOAT_VALUE_RESULT, |update| {
                let value = update.input_float(FLOAT_VALUE_INPUT)?;
                update.set_value(value);
                Ok(())
            })
        },
    )?;

    registry.register_operator(
        node(PICK_FLOAT_ID, "data.pick_float", nc)
            .with_description("Select one connected value by index; the index wraps")
            .with_inputs(vec![
                multi(PICK_FLOAT_VALUES, "Input", Float),
                inp(PICK_FLOAT_INDEX, "Index", 0_i64),
            ])
            .with_outputs(vec![out(PICK_FLOAT_SELECTED, "Selected", Float)]),
        || {
            let warmed_up = AtomicBool::new(false);
            OperatorBehavior::new().with_output(PICK_FLOAT_SELECTED, move |update| {
                let sources = update.collected_inputs(PICK_FLOAT_VALUES)?;

                // One-time read of every source so none is left dirty from the start.
                if !warmed_up.swap(true, Ordering::Relaxed) {
                    for source in &sources {
                        update.pull(*source)?;
                    }
                }

                let index = update.input_int(PICK_FLOAT_INDEX)?;
                let value = match wrap_index(index, sources.len()) {
                    Some(position) => update.pull(sources[position])?.as_float(0.0),
                    None => 0.0,
                };
                update.clear_input_dirty(PICK_FLOAT_VALUES)?;
                update.set_value(value);
                Ok(())
            })
        },
    )?;

    registry.register_operator(
        node(VALUE_RECORDER_ID, "data.value_recorder", nc)
            .with_description("Pass a value through and keep a history of recent values")
            .with_inputs(vec![inp(VALUE_RECORDER_INPUT, "Value", 0.0)])
            .with_outputs(vec![
                out(VALUE_RECORDER_RESULT, "Result", Float)
                    .with_output_data(RecordedValues::factory),
            ]),
        || {
            OperatorBehavior::new().with_output(VALUE_RECORDER_RESULT, |update| {
                let value = update.input_float(VALUE_RECORDER_INPUT)?;
                if let Some(history) = update.output_data_mut::<RecordedValues>() {
                    history.push(value);
                }
                update.set_value(value);
                Ok(())
            })
        },
    )?;

    Ok(())
}
