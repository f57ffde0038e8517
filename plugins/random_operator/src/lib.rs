use operator_graph::model::{InputDefinition, OutputDefinition, Symbol, SymbolCategory, ValueType};
use operator_graph::{DirtyFlagTrigger, LibraryError, OperatorBehavior, OperatorPlugin, OperatorRegistry, Plugin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

pub const RANDOM_NOISE_ID: Uuid = Uuid::from_u128(0x64d96810_0a95_497c_982c_8072c2759a68);
pub const RANDOM_NOISE_AMPLITUDE: Uuid = Uuid::from_u128(0x7a9a21c9_81b3_4908_8a06_9d78d6614f30);
pub const RANDOM_NOISE_SEED: Uuid = Uuid::from_u128(0xafc27471_5e8a_4686_869f_33979fcb2143);
pub const RANDOM_NOISE_VALUE: Uuid = Uuid::from_u128(0x6edd4cdd_cd7b_4a4d_b449_0e4934e8e594);

pub struct RandomOperatorPlugin;

impl Plugin for RandomOperatorPlugin {
    fn id(&self) -> &'static str {
        "random_operator_plugin"
    }

    fn name(&self) -> String {
        "Random Operators".to_string()
    }

    fn category(&self) -> String {
        "Operator".to_string()
    }

    fn version(&self) -> (u32, u32, u32) {
        (0, 1, 0)
    }
}

impl OperatorPlugin for RandomOperatorPlugin {
    fn register_operators(&self, registry: &mut OperatorRegistry) -> Result<(), LibraryError> {
        registry.register_operator(
            Symbol::new(RANDOM_NOISE_ID, "random.noise", SymbolCategory::Custom)
                .with_description("Seeded noise that changes every millisecond of local time")
                .with_inputs(vec![
                    InputDefinition::new(RANDOM_NOISE_AMPLITUDE, "Amplitude", 1.0),
                    InputDefinition::new(RANDOM_NOISE_SEED, "Seed", 0_i64),
                ])
                .with_outputs(vec![
                    OutputDefinition::new(RANDOM_NOISE_VALUE, "Value", ValueType::Float)
                        .with_trigger(DirtyFlagTrigger::Animated),
                ]),
            || {
                OperatorBehavior::new().with_output(RANDOM_NOISE_VALUE, |update| {
                    let amplitude = update.input_float(RANDOM_NOISE_AMPLITUDE)?.abs();
                    let seed = update.input_int(RANDOM_NOISE_SEED)? as u64;
                    update.set_value(noise(seed, amplitude, update.local_time()));
                    Ok(())
                })
            },
        )
    }
}

/// Value of the noise at `time`; constant within each millisecond.
pub fn noise(seed: u64, amplitude: f64, time: f64) -> f64 {
    if amplitude == 0.0 {
        return 0.0;
    }
    let time_bucket = (time * 1000.0).round() as u64;
    let mut rng = StdRng::seed_from_u64(seed ^ time_bucket);
    rng.gen_range(-amplitude..=amplitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use operator_graph::{EvaluationContext, Graph};

    #[test]
    fn test_noise_is_deterministic_and_bounded() {
        for frame in 0..20 {
            let t = frame as f64 / 30.0;
            let value = noise(7, 2.0, t);
            assert_eq!(value, noise(7, 2.0, t));
            assert!((-2.0..=2.0).contains(&value));
        }
        assert_eq!(noise(7, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_noise_operator_recomputes_every_pull() {
        let mut registry = OperatorRegistry::new();
        registry.register_plugin(&RandomOperatorPlugin).unwrap();

        let mut graph = Graph::new();
        let root = graph.instantiate_root(&registry, RANDOM_NOISE_ID).unwrap();
        graph.set_input_value(root, RANDOM_NOISE_SEED, 3_i64).unwrap();
        let out = graph.output_slot(root, RANDOM_NOISE_VALUE).unwrap();

        let ctx = EvaluationContext::new(0.5, 1);
        let first = graph.get_value_as::<f64>(out, &ctx).unwrap();
        let second = graph.get_value_as::<f64>(out, &ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, noise(3, 1.0, 0.5));
        assert_eq!(graph.slot(out).unwrap().update_count(), 2);
    }
}
