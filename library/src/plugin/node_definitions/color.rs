use uuid::Uuid;

use super::{inp, node, out};
use crate::error::LibraryError;
use crate::evaluation::UpdateContext;
use crate::model::gradient::{Gradient, Interpolation};
use crate::model::symbol::SymbolCategory;
use crate::model::value::ValueType;
use crate::plugin::{OperatorBehavior, OperatorRegistry};

pub const SAMPLE_GRADIENT_ID: Uuid = Uuid::from_u128(0xa95c4524_1023_4b08_901d_ecaaf0750d83);
pub const SAMPLE_GRADIENT_POSITION: Uuid = Uuid::from_u128(0xa4527e01_f19a_4200_85e5_00144f3ce061);
pub const SAMPLE_GRADIENT_GRADIENT: Uuid = Uuid::from_u128(0xeff10fad_cf95_4133_91db_efc41258cd1b);
pub const SAMPLE_GRADIENT_INTERPOLATION: Uuid = Uuid::from_u128(0x76cf4a72_2d25_48cb_a1ec_08d0ddabb053);
pub const SAMPLE_GRADIENT_COLOR: Uuid = Uuid::from_u128(0x963611e7_f55e_4c94_96e6_34e195558a2b);
pub const SAMPLE_GRADIENT_OUT_GRADIENT: Uuid = Uuid::from_u128(0x9f3d0701_86e8_436e_8652_918ba23b2cef);

pub(super) fn register(registry: &mut OperatorRegistry) -> Result<(), LibraryError> {
    registry.register_operator(
        node(SAMPLE_GRADIENT_ID, "color.sample_gradient", SymbolCategory::Color)
            .with_inputs(vec![
                inp(SAMPLE_GRADIENT_POSITION, "SamplePos", 0.5),
                inp(SAMPLE_GRADIENT_GRADIENT, "Gradient", Gradient::default()),
                inp(SAMPLE_GRADIENT_INTERPOLATION, "Interpolation", 0_i64),
            ])
            .with_outputs(vec![
                out(SAMPLE_GRADIENT_COLOR, "Color", ValueType::Vec4),
                out(SAMPLE_GRADIENT_OUT_GRADIENT, "OutGradient", ValueType::Gradient),
            ]),
        || {
            OperatorBehavior::new()
                .with_output(SAMPLE_GRADIENT_COLOR, |update| {
                    let gradient = configured_gradient(update)?;
                    let position = update.input_float(SAMPLE_GRADIENT_POSITION)?;
                    update.set_value(gradient.sample(position));
                    Ok(())
                })
                .with_output(SAMPLE_GRADIENT_OUT_GRADIENT, |update| {
                    let gradient = configured_gradient(update)?;
                    update.set_value(gradient);
                    Ok(())
                })
        },
    )
}

/// Gradient input with the interpolation input applied.
fn configured_gradient(update: &mut UpdateContext<'_>) -> Result<Gradient, LibraryError> {
    let mut gradient = update.input_as::<Gradient>(SAMPLE_GRADIENT_GRADIENT)?;
    let interpolation = update.input_int(SAMPLE_GRADIENT_INTERPOLATION)?;
    gradient.interpolation = Interpolation::from_index(interpolation);
    Ok(gradient)
}
