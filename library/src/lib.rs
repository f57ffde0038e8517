pub mod animation;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod plugin;
pub mod runtime;

use std::path::Path;

use log::info;
use uuid::Uuid;

pub use config::EngineConfig;
pub use error::LibraryError;
pub use evaluation::{EvaluationContext, UpdateAction, UpdateContext};
pub use model::{
    Connection, InputDefinition, OutputDefinition, SlotRef, SlotValue, Symbol, SymbolCategory,
    SymbolChild, ValueType,
};
pub use plugin::{OperatorBehavior, OperatorPlugin, OperatorRegistry, Plugin};
pub use runtime::{DirtyFlagTrigger, Graph, InstanceId, SlotId};

use plugin::node_definitions::{data, math, time};

pub const DEMO_SYMBOL_ID: Uuid = Uuid::from_u128(0x5dd3e4b2_4ae4_448c_9fe4_3c6fe9402d28);
pub const DEMO_INDEX: Uuid = Uuid::from_u128(0x19fd003c_1f1f_457a_92b5_85c2451d941b);
pub const DEMO_RESULT: Uuid = Uuid::from_u128(0x1e5299da_2d71_4b5e_aead_9c301f6511bb);

/// Register the demo composite: a clock scaled by a constant and a fixed sum,
/// selected by the `Index` input.
pub fn register_demo_symbol(registry: &mut OperatorRegistry) -> Result<Uuid, LibraryError> {
    registry.register_symbol(
        Symbol::new(DEMO_SYMBOL_ID, "demo.main", SymbolCategory::Composite)
            .with_inputs(vec![InputDefinition::new(DEMO_INDEX, "Index", 0_i64)])
            .with_outputs(vec![OutputDefinition::new(DEMO_RESULT, "Result", ValueType::Float)]),
    )?;

    let clock = registry.add_child(DEMO_SYMBOL_ID, time::CLOCK_ID)?;
    let scale = registry.add_child(DEMO_SYMBOL_ID, data::FLOAT_VALUE_ID)?;
    let multiply = registry.add_child(DEMO_SYMBOL_ID, math::MULTIPLY_ID)?;
    let add = registry.add_child(DEMO_SYMBOL_ID, math::ADD_ID)?;
    let pick = registry.add_child(DEMO_SYMBOL_ID, data::PICK_FLOAT_ID)?;

    if let Some(child) = registry
        .symbol_mut(DEMO_SYMBOL_ID)
        .and_then(|s| s.child_mut(scale))
    {
        child.set_input_value(data::FLOAT_VALUE_INPUT, 2.0)?;
    }

    let wires = [
        (clock, time::CLOCK_TIME, multiply, math::MULTIPLY_A),
        (scale, data::FLOAT_VALUE_RESULT, multiply, math::MULTIPLY_B),
        (multiply, math::MULTIPLY_RESULT, pick, data::PICK_FLOAT_VALUES),
        (add, math::ADD_RESULT, pick, data::PICK_FLOAT_VALUES),
    ];
    for (source, output, target, input) in wires {
        registry.add_connection(
            DEMO_SYMBOL_ID,
            Connection::new(SlotRef::new(source, output), SlotRef::new(target, input)),
        )?;
    }
    registry.add_connection(
        DEMO_SYMBOL_ID,
        Connection::new(
            SlotRef::boundary(DEMO_INDEX),
            SlotRef::new(pick, data::PICK_FLOAT_INDEX),
        ),
    )?;
    registry.add_connection(
        DEMO_SYMBOL_ID,
        Connection::new(
            SlotRef::new(pick, data::PICK_FLOAT_SELECTED),
            SlotRef::boundary(DEMO_RESULT),
        ),
    )?;
    Ok(DEMO_SYMBOL_ID)
}

/// Command-line entry: `cli [config.toml] [index]`.
pub fn run(args: Vec<String>) -> Result<(), LibraryError> {
    let config = match args.get(1) {
        Some(path) => EngineConfig::load(Path::new(path))?,
        None => EngineConfig::default(),
    };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .try_init();

    let index: i64 = match args.get(2) {
        Some(arg) => arg
            .parse()
            .map_err(|e| LibraryError::runtime(format!("Invalid index {}: {}", arg, e)))?,
        None => 0,
    };

    let mut registry = OperatorRegistry::with_builtin_operators();
    let symbol_id = register_demo_symbol(&mut registry)?;

    let mut graph = Graph::from_config(&config);
    let root = graph.instantiate_root(&registry, symbol_id)?;
    graph.set_input_value(root, DEMO_INDEX, index)?;
    let output = graph.output_slot(root, DEMO_RESULT)?;
    info!(
        "Evaluating {} frame(s) at {} fps ({} slots)",
        config.frames,
        config.fps,
        graph.slot_count()
    );

    for frame in 0..config.frames {
        let ctx = EvaluationContext::from_config(&config, frame);
        let value = graph.try_get_value(output, &ctx)?;
        println!(
            "frame {:>4}  t={:>8.3}  {}",
            frame,
            ctx.time(),
            value.as_float(f64::NAN)
        );
    }
    Ok(())
}
