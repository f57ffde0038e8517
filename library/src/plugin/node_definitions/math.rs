use uuid::Uuid;

use super::{inp, multi, node, out};
use crate::error::LibraryError;
use crate::model::symbol::SymbolCategory;
use crate::model::value::{SlotValue, ValueType};
use crate::plugin::{OperatorBehavior, OperatorRegistry};

pub const ADD_ID: Uuid = Uuid::from_u128(0x2c8ac234_1a06_4d9f_a3f6_31084a104e14);
pub const ADD_INPUT_1: Uuid = Uuid::from_u128(0xe3550929_8905_4cdf_bc85_c31e97da4baa);
pub const ADD_INPUT_2: Uuid = Uuid::from_u128(0x993d59bb_1fc0_4857_a36d_629b0e7aa0d2);
pub const ADD_RESULT: Uuid = Uuid::from_u128(0x5ce9c625_f890_4620_9747_c98eab4b9447);

pub const MULTIPLY_ID: Uuid = Uuid::from_u128(0x2a49253e_305a_4422_be63_a50e2f12d0e7);
pub const MULTIPLY_A: Uuid = Uuid::from_u128(0x47919c35_063a_427e_8acf_1d201a2b826c);
pub const MULTIPLY_B: Uuid = Uuid::from_u128(0xa74d1088_9470_4ff4_97cb_709f8dddabe6);
pub const MULTIPLY_RESULT: Uuid = Uuid::from_u128(0x2779099e_b5c4_4452_bb69_d8427196b90c);

pub const SUM_ID: Uuid = Uuid::from_u128(0xa54bae64_6bd4_4534_aedb_d1ab1ec86b24);
pub const SUM_VALUES: Uuid = Uuid::from_u128(0xaa162cc7_88bf_4a20_88cb_b9f401bf72c1);
pub const SUM_RESULT: Uuid = Uuid::from_u128(0x1f9f61bd_7612_4e6f_b8cf_f50c16b25a93);

pub(super) fn register(registry: &mut OperatorRegistry) -> Result<(), LibraryError> {
    use ValueType::*;
    let nc = SymbolCategory::Math;

    registry.register_operator(
        node(ADD_ID, "math.add", nc)
            .with_inputs(vec![
                inp(ADD_INPUT_1, "Input1", 29.0),
                inp(ADD_INPUT_2, "Input2", 23.0),
            ])
            .with_outputs(vec![out(ADD_RESULT, "Result", Float)]),
        || {
            OperatorBehavior::new().with_output(ADD_RESULT, |update| {
                let a = update.input_float(ADD_INPUT_1)?;
                let b = update.input_float(ADD_INPUT_2)?;
                update.set_value(a + b);
                Ok(())
            })
        },
    )?;

    registry.register_operator(
        node(MULTIPLY_ID, "math.multiply", nc)
            .with_inputs(vec![inp(MULTIPLY_A, "A", 1.0), inp(MULTIPLY_B, "B", 1.0)])
            .with_outputs(vec![out(MULTIPLY_RESULT, "Result", Float)]),
        || {
            OperatorBehavior::new().with_output(MULTIPLY_RESULT, |update| {
                let a = update.input_float(MULTIPLY_A)?;
                let b = update.input_float(MULTIPLY_B)?;
                update.set_value(a * b);
                Ok(())
            })
        },
    )?;

    registry.register_operator(
        node(SUM_ID, "math.sum", nc)
            .with_description("Sum of every connected value")
            .with_inputs(vec![multi(SUM_VALUES, "Values", Float)])
            .with_outputs(vec![out(SUM_RESULT, "Result", Float)]),
        || {
            OperatorBehavior::new().with_output(SUM_RESULT, |update| {
                let values = update.input_as::<Vec<SlotValue>>(SUM_VALUES)?;
                let sum: f64 = values.iter().map(|v| v.as_float(0.0)).sum();
                update.set_value(sum);
                Ok(())
            })
        },
    )?;

    Ok(())
}
