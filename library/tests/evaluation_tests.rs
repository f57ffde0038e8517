use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use operator_graph::plugin::node_definitions::{data, math, time};
use operator_graph::runtime::TransformCallback;
use operator_graph::{
    Connection, DirtyFlagTrigger, EvaluationContext, Graph, InputDefinition, InstanceId, LibraryError,
    OperatorBehavior, OperatorRegistry, OutputDefinition, SlotRef, SlotValue, Symbol, SymbolCategory,
    UpdateAction, UpdateContext, ValueType,
};
use uuid::Uuid;

const COUNTER_ID: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90001);
const COUNTER_INPUT: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90002);
const COUNTER_RESULT: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90003);

const CHAIN_ID: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90010);
const CHAIN_RESULT: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90011);

/// Registry with the built-ins plus `test.counter`, which doubles its input,
/// counts its recomputes and fails on negative input.
fn counter_registry(calls: &Arc<AtomicUsize>) -> OperatorRegistry {
    let mut registry = OperatorRegistry::with_builtin_operators();
    let calls = calls.clone();
    registry
        .register_operator(
            Symbol::new(COUNTER_ID, "test.counter", SymbolCategory::Custom)
                .with_inputs(vec![InputDefinition::new(COUNTER_INPUT, "Value", 1.0)])
                .with_outputs(vec![OutputDefinition::new(COUNTER_RESULT, "Result", ValueType::Float)]),
            move || {
                let calls = calls.clone();
                OperatorBehavior::new().with_output(COUNTER_RESULT, move |update| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let value = update.input_float(COUNTER_INPUT)?;
                    if value < 0.0 {
                        return Err(LibraryError::UpdateFailed {
                            slot: update.slot_id(),
                            message: "negative input".to_string(),
                        });
                    }
                    update.set_value(value * 2.0);
                    Ok(())
                })
            },
        )
        .unwrap();
    registry
}

fn wire(registry: &mut OperatorRegistry, parent: Uuid, source: SlotRef, target: SlotRef) {
    registry
        .add_connection(parent, Connection::new(source, target))
        .unwrap();
}

/// Composite `a -> b -> c -> Result` of three counters. Returns the child ids.
fn register_chain(registry: &mut OperatorRegistry) -> [Uuid; 3] {
    registry
        .register_symbol(
            Symbol::new(CHAIN_ID, "test.chain", SymbolCategory::Composite)
                .with_outputs(vec![OutputDefinition::new(CHAIN_RESULT, "Result", ValueType::Float)]),
        )
        .unwrap();
    let a = registry.add_child(CHAIN_ID, COUNTER_ID).unwrap();
    let b = registry.add_child(CHAIN_ID, COUNTER_ID).unwrap();
    let c = registry.add_child(CHAIN_ID, COUNTER_ID).unwrap();
    wire(registry, CHAIN_ID, SlotRef::new(a, COUNTER_RESULT), SlotRef::new(b, COUNTER_INPUT));
    wire(registry, CHAIN_ID, SlotRef::new(b, COUNTER_RESULT), SlotRef::new(c, COUNTER_INPUT));
    wire(registry, CHAIN_ID, SlotRef::new(c, COUNTER_RESULT), SlotRef::boundary(CHAIN_RESULT));
    [a, b, c]
}

fn child(graph: &Graph, parent: InstanceId, child_id: Uuid) -> InstanceId {
    graph
        .instance(parent)
        .and_then(|i| i.child(child_id))
        .expect("child instance")
}

#[test]
fn test_repeated_pull_does_not_recompute() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = counter_registry(&calls);
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, COUNTER_ID).unwrap();
    let out = graph.output_slot(root, COUNTER_RESULT).unwrap();

    let ctx = EvaluationContext::new(0.0, 1);
    assert_eq!(graph.try_get_value(out, &ctx).unwrap(), SlotValue::from(2.0));
    assert_eq!(graph.try_get_value(out, &ctx).unwrap(), SlotValue::from(2.0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A new frame alone does not dirty a slot that never read time.
    let next = ctx.next_frame(1.0 / 60.0);
    assert_eq!(graph.get_value_as::<f64>(out, &next), Some(2.0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    graph.set_input_value(root, COUNTER_INPUT, 3.0).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &next), Some(6.0));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(graph.slot(out).unwrap().update_count(), 2);
}

#[test]
fn test_change_propagates_down_the_chain() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = counter_registry(&calls);
    let [a, _, _] = register_chain(&mut registry);

    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, CHAIN_ID).unwrap();
    let out = graph.output_slot(root, CHAIN_RESULT).unwrap();
    let ctx = EvaluationContext::new(0.0, 1);

    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(8.0));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(8.0));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let a_instance = child(&graph, root, a);
    graph.set_input_value(a_instance, COUNTER_INPUT, 5.0).unwrap();
    assert!(graph.slot(out).unwrap().dirty_flag().is_dirty());
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(40.0));
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[test]
fn test_invalidate_marks_downstream_only() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = counter_registry(&calls);
    let [a, b, _] = register_chain(&mut registry);

    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, CHAIN_ID).unwrap();
    let out = graph.output_slot(root, CHAIN_RESULT).unwrap();
    let ctx = EvaluationContext::new(0.0, 1);
    graph.get_value(out, &ctx);

    let a_out = graph.output_slot(child(&graph, root, a), COUNTER_RESULT).unwrap();
    let b_out = graph.output_slot(child(&graph, root, b), COUNTER_RESULT).unwrap();
    graph.invalidate(b_out).unwrap();

    assert!(!graph.slot(a_out).unwrap().dirty_flag().is_dirty());
    assert!(graph.slot(b_out).unwrap().dirty_flag().is_dirty());
    assert!(graph.slot(out).unwrap().dirty_flag().is_dirty());

    graph.get_value(out, &ctx);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

const CLOCKED_ID: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90020);
const CLOCKED_RESULT: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90021);

/// Composite exposing a counter fed by a clock.
fn register_clocked(registry: &mut OperatorRegistry) {
    registry
        .register_symbol(
            Symbol::new(CLOCKED_ID, "test.clocked", SymbolCategory::Composite)
                .with_outputs(vec![OutputDefinition::new(CLOCKED_RESULT, "Result", ValueType::Float)]),
        )
        .unwrap();
    let clock = registry.add_child(CLOCKED_ID, time::CLOCK_ID).unwrap();
    let counter = registry.add_child(CLOCKED_ID, COUNTER_ID).unwrap();
    wire(
        registry,
        CLOCKED_ID,
        SlotRef::new(clock, time::CLOCK_TIME),
        SlotRef::new(counter, COUNTER_INPUT),
    );
    wire(
        registry,
        CLOCKED_ID,
        SlotRef::new(counter, COUNTER_RESULT),
        SlotRef::boundary(CLOCKED_RESULT),
    );
}

#[test]
fn test_time_varying_source_recomputes_once_per_frame() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = counter_registry(&calls);
    register_clocked(&mut registry);

    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, CLOCKED_ID).unwrap();
    let out = graph.output_slot(root, CLOCKED_RESULT).unwrap();

    let frame_1 = EvaluationContext::new(0.5, 1);
    assert_eq!(graph.get_value_as::<f64>(out, &frame_1), Some(1.0));
    assert_eq!(graph.get_value_as::<f64>(out, &frame_1), Some(1.0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(graph.slot(out).unwrap().dirty_flag().is_time_varying());

    let frame_2 = EvaluationContext::new(1.0, 2);
    assert_eq!(graph.get_value_as::<f64>(out, &frame_2), Some(2.0));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_animated_trigger_recomputes_every_pull() {
    let registry = OperatorRegistry::with_builtin_operators();
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, time::CLOCK_ID).unwrap();
    graph.set_input_value(root, time::CLOCK_SPEED, 2.0).unwrap();
    let out = graph.output_slot(root, time::CLOCK_TIME).unwrap();

    let ctx = EvaluationContext::new(1.5, 7);
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(3.0));
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(3.0));
    assert_eq!(graph.slot(out).unwrap().update_count(), 2);
    assert!(graph.slot(out).unwrap().dirty_flag().is_dirty());
}

#[test]
fn test_failed_update_keeps_previous_value() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = counter_registry(&calls);
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, COUNTER_ID).unwrap();
    let out = graph.output_slot(root, COUNTER_RESULT).unwrap();
    let ctx = EvaluationContext::new(0.0, 1);
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(2.0));

    graph.set_input_value(root, COUNTER_INPUT, -1.0).unwrap();
    let err = graph.try_get_value(out, &ctx).unwrap_err();
    assert!(matches!(err, LibraryError::UpdateFailed { slot, .. } if slot == out));
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(2.0));
    assert!(graph.slot(out).unwrap().dirty_flag().is_dirty());

    graph.set_input_value(root, COUNTER_INPUT, 4.0).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(8.0));
}

#[test]
fn test_failing_upstream_uses_its_last_value() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = counter_registry(&calls);
    let [a, _, _] = register_chain(&mut registry);

    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, CHAIN_ID).unwrap();
    let out = graph.output_slot(root, CHAIN_RESULT).unwrap();
    let ctx = EvaluationContext::new(0.0, 1);
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(8.0));

    let a_instance = child(&graph, root, a);
    graph.set_input_value(a_instance, COUNTER_INPUT, -3.0).unwrap();
    assert_eq!(graph.try_get_value(out, &ctx).unwrap(), SlotValue::from(8.0));

    let a_out = graph.output_slot(a_instance, COUNTER_RESULT).unwrap();
    assert!(graph.slot(a_out).unwrap().dirty_flag().is_dirty());
}

#[test]
fn test_cycle_guard_reports_reentrant_pull() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = counter_registry(&calls);
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, COUNTER_ID).unwrap();
    let out = graph.output_slot(root, COUNTER_RESULT).unwrap();

    let reentrant: UpdateAction = Arc::new(move |update: &mut UpdateContext<'_>| {
        let value = update.pull(out)?;
        update.set_value(value);
        Ok(())
    });
    graph.set_update_action(out, reentrant).unwrap();

    let ctx = EvaluationContext::new(0.0, 1);
    let err = graph.try_get_value(out, &ctx).unwrap_err();
    assert!(matches!(err, LibraryError::CyclicEvaluation(slot) if slot == out));

    let constant: UpdateAction = Arc::new(|update: &mut UpdateContext<'_>| {
        update.set_value(9.0);
        Ok(())
    });
    graph.set_update_action(out, constant).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(9.0));
}

#[test]
fn test_decorators_run_before_base_in_reverse_install_order() {
    let registry = OperatorRegistry::with_builtin_operators();
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, math::ADD_ID).unwrap();
    let out = graph.output_slot(root, math::ADD_RESULT).unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let base_log = log.clone();
    let base: UpdateAction = Arc::new(move |update: &mut UpdateContext<'_>| {
        base_log.lock().unwrap().push("base");
        let sum = update.input_float(math::ADD_INPUT_1)? + update.input_float(math::ADD_INPUT_2)?;
        update.set_value(sum);
        Ok(())
    });
    graph.set_update_action(out, base).unwrap();

    for name in ["first", "second"] {
        let log = log.clone();
        graph
            .add_decorator(out, move |_: &mut UpdateContext<'_>| -> Result<(), LibraryError> {
                log.lock().unwrap().push(name);
                Ok(())
            })
            .unwrap();
    }

    let ctx = EvaluationContext::new(0.0, 1);
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(52.0));
    assert_eq!(*log.lock().unwrap(), vec!["second", "first", "base"]);
    assert_eq!(graph.slot(out).unwrap().decorator_count(), 2);

    graph.clear_decorators(out).unwrap();
    log.lock().unwrap().clear();
    graph.get_value(out, &ctx);
    assert_eq!(*log.lock().unwrap(), vec!["base"]);
}

#[test]
fn test_disabled_slot_keeps_value_and_stays_dirty() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = counter_registry(&calls);
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, COUNTER_ID).unwrap();
    let out = graph.output_slot(root, COUNTER_RESULT).unwrap();
    let ctx = EvaluationContext::new(0.0, 1);
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(2.0));

    graph.set_disabled(out, true).unwrap();
    graph.set_input_value(root, COUNTER_INPUT, 10.0).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(2.0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(graph.slot(out).unwrap().is_disabled());
    assert!(graph.slot(out).unwrap().dirty_flag().is_dirty());

    graph.set_disabled(out, false).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(20.0));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_decorated_slot_disable_and_enable() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = counter_registry(&calls);
    register_clocked(&mut registry);
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, CLOCKED_ID).unwrap();
    let out = graph.output_slot(root, CLOCKED_RESULT).unwrap();

    let transforms = Arc::new(AtomicUsize::new(0));
    let counter = transforms.clone();
    graph
        .add_decorator(
            out,
            TransformCallback::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    let frame_1 = EvaluationContext::new(0.5, 1);
    graph.set_disabled(out, true).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &frame_1), Some(0.0));
    assert_eq!(graph.get_value_as::<f64>(out, &frame_1), Some(0.0));
    assert_eq!(transforms.load(Ordering::SeqCst), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(graph.slot(out).unwrap().dirty_flag().is_dirty());

    graph.set_disabled(out, false).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &frame_1), Some(1.0));
    assert_eq!(graph.get_value_as::<f64>(out, &frame_1), Some(1.0));
    assert_eq!(transforms.load(Ordering::SeqCst), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let frame_2 = EvaluationContext::new(1.0, 2);
    assert_eq!(graph.get_value_as::<f64>(out, &frame_2), Some(2.0));
    assert_eq!(transforms.load(Ordering::SeqCst), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Disabling again freezes the last value.
    graph.set_disabled(out, true).unwrap();
    let frame_3 = EvaluationContext::new(1.5, 3);
    assert_eq!(graph.get_value_as::<f64>(out, &frame_3), Some(2.0));
    assert_eq!(transforms.load(Ordering::SeqCst), 2);
    assert_eq!(graph.slot(out).unwrap().decorator_count(), 1);
}

#[test]
fn test_always_trigger_runs_decorator_on_every_pull() {
    let registry = OperatorRegistry::with_builtin_operators();
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, math::MULTIPLY_ID).unwrap();
    let out = graph.output_slot(root, math::MULTIPLY_RESULT).unwrap();
    graph.set_trigger(out, DirtyFlagTrigger::Always).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    graph
        .add_decorator(
            out,
            TransformCallback::new(move |instance, ctx| {
                recorder.lock().unwrap().push((instance, ctx.frame_id()));
            }),
        )
        .unwrap();

    graph.get_value(out, &EvaluationContext::new(0.0, 1));
    graph.get_value(out, &EvaluationContext::new(0.0, 1));
    assert_eq!(*seen.lock().unwrap(), vec![(root, 1), (root, 1)]);
    assert_eq!(
        graph.slot(out).unwrap().dirty_flag().trigger(),
        DirtyFlagTrigger::Always
    );
}

/// Composite picking among three float values. Returns the child ids of the
/// values and of the pick.
fn register_picker(registry: &mut OperatorRegistry, symbol_id: Uuid, result: Uuid) -> (Vec<Uuid>, Uuid) {
    registry
        .register_symbol(
            Symbol::new(symbol_id, "test.picker", SymbolCategory::Composite)
                .with_outputs(vec![OutputDefinition::new(result, "Result", ValueType::Float)]),
        )
        .unwrap();
    let pick = registry.add_child(symbol_id, data::PICK_FLOAT_ID).unwrap();
    let mut values = Vec::new();
    for value in [1.0, 2.0, 3.0] {
        let id = registry.add_child(symbol_id, data::FLOAT_VALUE_ID).unwrap();
        registry
            .symbol_mut(symbol_id)
            .and_then(|s| s.child_mut(id))
            .unwrap()
            .set_input_value(data::FLOAT_VALUE_INPUT, value)
            .unwrap();
        wire(
            registry,
            symbol_id,
            SlotRef::new(id, data::FLOAT_VALUE_RESULT),
            SlotRef::new(pick, data::PICK_FLOAT_VALUES),
        );
        values.push(id);
    }
    wire(
        registry,
        symbol_id,
        SlotRef::new(pick, data::PICK_FLOAT_SELECTED),
        SlotRef::boundary(result),
    );
    (values, pick)
}

#[test]
fn test_pick_wraps_index() {
    const PICKER_ID: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90030);
    const PICKER_RESULT: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90031);

    let mut registry = OperatorRegistry::with_builtin_operators();
    let (values, pick) = register_picker(&mut registry, PICKER_ID, PICKER_RESULT);

    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, PICKER_ID).unwrap();
    let out = graph.output_slot(root, PICKER_RESULT).unwrap();
    let pick_instance = child(&graph, root, pick);
    let ctx = EvaluationContext::new(0.0, 1);

    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(1.0));

    graph.set_input_value(pick_instance, data::PICK_FLOAT_INDEX, -1_i64).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(3.0));

    graph.set_input_value(pick_instance, data::PICK_FLOAT_INDEX, 4_i64).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(2.0));

    // Editing the selected source reaches the pick through the multi-input.
    let second = child(&graph, root, values[1]);
    graph.set_input_value(second, data::FLOAT_VALUE_INPUT, 7.0).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(7.0));
}

#[test]
fn test_pick_warm_up_leaves_sources_clean() {
    const PICKER_ID: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90032);
    const PICKER_RESULT: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90033);

    let mut registry = OperatorRegistry::with_builtin_operators();
    let (values, _) = register_picker(&mut registry, PICKER_ID, PICKER_RESULT);

    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, PICKER_ID).unwrap();
    let out = graph.output_slot(root, PICKER_RESULT).unwrap();
    graph.get_value(out, &EvaluationContext::new(0.0, 1));

    for value in values {
        let source = graph
            .output_slot(child(&graph, root, value), data::FLOAT_VALUE_RESULT)
            .unwrap();
        assert!(!graph.slot(source).unwrap().dirty_flag().is_dirty());
    }
}

#[test]
fn test_pick_without_sources_outputs_zero() {
    let registry = OperatorRegistry::with_builtin_operators();
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, data::PICK_FLOAT_ID).unwrap();
    graph.set_input_value(root, data::PICK_FLOAT_INDEX, 5_i64).unwrap();
    let out = graph.output_slot(root, data::PICK_FLOAT_SELECTED).unwrap();
    assert_eq!(graph.get_value_as::<f64>(out, &EvaluationContext::new(0.0, 1)), Some(0.0));
}

#[test]
fn test_removed_source_falls_back_to_local_value() {
    const HOLDER_ID: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90040);
    const HOLDER_RESULT: Uuid = Uuid::from_u128(0x3f0c1b7e_40a2_4c55_9d0e_7a51e2c90041);

    let mut registry = OperatorRegistry::with_builtin_operators();
    registry
        .register_symbol(
            Symbol::new(HOLDER_ID, "test.holder", SymbolCategory::Composite)
                .with_outputs(vec![OutputDefinition::new(HOLDER_RESULT, "Result", ValueType::Float)]),
        )
        .unwrap();
    let value = registry.add_child(HOLDER_ID, data::FLOAT_VALUE_ID).unwrap();
    let add = registry.add_child(HOLDER_ID, math::ADD_ID).unwrap();
    wire(
        &mut registry,
        HOLDER_ID,
        SlotRef::new(value, data::FLOAT_VALUE_RESULT),
        SlotRef::new(add, math::ADD_INPUT_1),
    );
    wire(&mut registry, HOLDER_ID, SlotRef::new(add, math::ADD_RESULT), SlotRef::boundary(HOLDER_RESULT));

    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, HOLDER_ID).unwrap();
    let out = graph.output_slot(root, HOLDER_RESULT).unwrap();
    let value_instance = child(&graph, root, value);
    graph.set_input_value(value_instance, data::FLOAT_VALUE_INPUT, 5.0).unwrap();

    let ctx = EvaluationContext::new(0.0, 1);
    assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(28.0));

    graph.remove_child(root, value).unwrap();
    assert!(graph.slot(out).unwrap().dirty_flag().is_dirty());
    assert_eq!(graph.try_get_value(out, &ctx).unwrap(), SlotValue::from(52.0));
}

#[test]
fn test_unknown_slot_is_reported() {
    let registry = OperatorRegistry::with_builtin_operators();
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, math::ADD_ID).unwrap();
    let out = graph.output_slot(root, math::ADD_RESULT).unwrap();
    graph.remove_instance(root).unwrap();

    let ctx = EvaluationContext::new(0.0, 1);
    assert!(matches!(
        graph.try_get_value(out, &ctx),
        Err(LibraryError::SlotNotFound(slot)) if slot == out
    ));
    assert_eq!(graph.get_value(out, &ctx), SlotValue::default());
}

#[test]
fn test_value_recorder_keeps_history_in_output_data() {
    use operator_graph::model::RecordedValues;
    use operator_graph::plugin::node_definitions::color;

    let registry = OperatorRegistry::with_builtin_operators();
    let mut graph = Graph::new();
    let root = graph.instantiate_root(&registry, data::VALUE_RECORDER_ID).unwrap();
    let out = graph.output_slot(root, data::VALUE_RECORDER_RESULT).unwrap();

    for (frame, value) in [1.0, 2.0, 3.0].into_iter().enumerate() {
        graph.set_input_value(root, data::VALUE_RECORDER_INPUT, value).unwrap();
        let ctx = EvaluationContext::new(0.0, frame as u64);
        assert_eq!(graph.get_value_as::<f64>(out, &ctx), Some(value));
    }
    let history = graph
        .slot(out)
        .and_then(|s| s.output_data())
        .and_then(|d| d.downcast_ref::<RecordedValues>())
        .expect("recorder history");
    assert_eq!(history.values().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);

    let sampler = graph.instantiate_root(&registry, color::SAMPLE_GRADIENT_ID).unwrap();
    let color_out = graph.output_slot(sampler, color::SAMPLE_GRADIENT_COLOR).unwrap();
    let value = graph.get_value(color_out, &EvaluationContext::new(0.0, 1));
    assert_eq!(value.value_type(), ValueType::Vec4);
}
