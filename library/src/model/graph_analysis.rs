//! Graph analysis utilities for composite symbols.
//!
//! The editing layer validates every connection here before it reaches a symbol,
//! so the runtime never sees mismatched types, doubly-fed inputs or cycles.

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

use super::connection::{Connection, SlotRef};
use super::symbol::Symbol;
use super::value::ValueType;
use crate::error::LibraryError;
use crate::plugin::OperatorRegistry;

/// Declared type and multiplicity of one end of a connection.
struct Endpoint {
    value_type: ValueType,
    is_multi_input: bool,
}

/// Validate a connection before adding it to `parent`.
///
/// Checks:
/// - Both endpoints exist and point in the right direction
/// - No self-connections
/// - Declared types are compatible
/// - Single-valued inputs accept at most one connection
/// - No cycles between children
pub fn validate_connection(
    registry: &OperatorRegistry,
    parent: &Symbol,
    conn: &Connection,
) -> Result<(), LibraryError> {
    let source = resolve_source(registry, parent, &conn.source)?;
    let target = resolve_target(registry, parent, &conn.target)?;

    if !conn.source.is_boundary() && conn.source.child_id == conn.target.child_id {
        return Err(LibraryError::invalid_connection(
            "Cannot connect a child to itself",
        ));
    }

    if !target.value_type.accepts(source.value_type) {
        return Err(LibraryError::TypeMismatch {
            expected: target.value_type,
            found: source.value_type,
        });
    }

    if !target.is_multi_input
        && parent
            .connections
            .iter()
            .any(|c| c.target == conn.target)
    {
        return Err(LibraryError::invalid_connection(format!(
            "Input {}.{} already has a connection",
            conn.target.child_id, conn.target.slot_id
        )));
    }

    if target.is_multi_input && parent.connections.iter().any(|c| c == conn) {
        return Err(LibraryError::invalid_connection("Duplicate connection"));
    }

    if !conn.source.is_boundary()
        && !conn.target.is_boundary()
        && would_create_cycle(parent, conn.source.child_id, conn.target.child_id)
    {
        return Err(LibraryError::invalid_connection(
            "Connection would create a cycle",
        ));
    }

    Ok(())
}

fn resolve_source(
    registry: &OperatorRegistry,
    parent: &Symbol,
    slot: &SlotRef,
) -> Result<Endpoint, LibraryError> {
    if slot.is_boundary() {
        let def = parent
            .input_definition(slot.slot_id)
            .ok_or(LibraryError::DefinitionNotFound(slot.slot_id))?;
        if def.is_multi_input {
            return Err(LibraryError::invalid_connection(format!(
                "Multi-input {} cannot be used as a source",
                def.name
            )));
        }
        return Ok(Endpoint {
            value_type: def.value_type,
            is_multi_input: false,
        });
    }

    let child_symbol = child_symbol(registry, parent, slot.child_id)?;
    let def = child_symbol
        .output_definition(slot.slot_id)
        .ok_or(LibraryError::DefinitionNotFound(slot.slot_id))?;
    Ok(Endpoint {
        value_type: def.value_type,
        is_multi_input: false,
    })
}

fn resolve_target(
    registry: &OperatorRegistry,
    parent: &Symbol,
    slot: &SlotRef,
) -> Result<Endpoint, LibraryError> {
    if slot.is_boundary() {
        let def = parent
            .output_definition(slot.slot_id)
            .ok_or(LibraryError::DefinitionNotFound(slot.slot_id))?;
        return Ok(Endpoint {
            value_type: def.value_type,
            is_multi_input: false,
        });
    }

    let child_symbol = child_symbol(registry, parent, slot.child_id)?;
    let def = child_symbol
        .input_definition(slot.slot_id)
        .ok_or(LibraryError::DefinitionNotFound(slot.slot_id))?;
    Ok(Endpoint {
        value_type: def.value_type,
        is_multi_input: def.is_multi_input,
    })
}

fn child_symbol<'a>(
    registry: &'a OperatorRegistry,
    parent: &Symbol,
    child_id: Uuid,
) -> Result<&'a Symbol, LibraryError> {
    let child = parent.child(child_id).ok_or(LibraryError::ChildNotFound {
        symbol: parent.id,
        child: child_id,
    })?;
    registry
        .symbol(child.symbol_id)
        .ok_or(LibraryError::SymbolNotFound(child.symbol_id))
}

/// Check if connecting from_child → to_child would create a cycle.
/// Returns true if to_child can already reach from_child via existing connections.
fn would_create_cycle(parent: &Symbol, from_child: Uuid, to_child: Uuid) -> bool {
    // BFS from to_child: if from_child is reachable, adding from→to creates a cycle.
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(to_child);

    while let Some(current) = queue.pop_front() {
        if current == from_child {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        for conn in &parent.connections {
            if conn.source.child_id == current && !conn.target.is_boundary() {
                queue.push_back(conn.target.child_id);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::symbol::SymbolCategory;
    use crate::model::symbol_child::SymbolChild;
    use crate::plugin::node_definitions::{data, math};

    fn setup() -> (OperatorRegistry, Symbol) {
        let registry = OperatorRegistry::with_builtin_operators();
        let parent = Symbol::new(Uuid::new_v4(), "test.parent", SymbolCategory::Composite);
        (registry, parent)
    }

    fn add_child(registry: &OperatorRegistry, parent: &mut Symbol, symbol_id: Uuid) -> Uuid {
        let symbol = registry.symbol(symbol_id).unwrap();
        let child = SymbolChild::new(symbol, Uuid::new_v4());
        let id = child.id;
        parent.children.push(child);
        id
    }

    #[test]
    fn test_validate_connection_self_loop() {
        let (registry, mut parent) = setup();
        let add = add_child(&registry, &mut parent, math::ADD_ID);

        let conn = Connection::new(
            SlotRef::new(add, math::ADD_RESULT),
            SlotRef::new(add, math::ADD_INPUT_1),
        );
        let result = validate_connection(&registry, &parent, &conn);
        assert!(result.unwrap_err().to_string().contains("itself"));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let (registry, mut parent) = setup();
        let pick = add_child(&registry, &mut parent, data::PICK_FLOAT_ID);
        let gradient = add_child(&registry, &mut parent, crate::plugin::node_definitions::color::SAMPLE_GRADIENT_ID);

        // Vec4 color into the Int index
        let conn = Connection::new(
            SlotRef::new(gradient, crate::plugin::node_definitions::color::SAMPLE_GRADIENT_COLOR),
            SlotRef::new(pick, data::PICK_FLOAT_INDEX),
        );
        let result = validate_connection(&registry, &parent, &conn);
        assert!(matches!(result, Err(LibraryError::TypeMismatch { .. })));
    }

    #[test]
    fn test_second_connection_to_single_input_rejected() {
        let (registry, mut parent) = setup();
        let a = add_child(&registry, &mut parent, math::ADD_ID);
        let b = add_child(&registry, &mut parent, math::ADD_ID);
        let c = add_child(&registry, &mut parent, math::ADD_ID);

        parent.connections.push(Connection::new(
            SlotRef::new(a, math::ADD_RESULT),
            SlotRef::new(c, math::ADD_INPUT_1),
        ));
        let conn = Connection::new(
            SlotRef::new(b, math::ADD_RESULT),
            SlotRef::new(c, math::ADD_INPUT_1),
        );
        assert!(validate_connection(&registry, &parent, &conn).is_err());
    }

    #[test]
    fn test_multi_input_accepts_many() {
        let (registry, mut parent) = setup();
        let a = add_child(&registry, &mut parent, math::ADD_ID);
        let b = add_child(&registry, &mut parent, math::ADD_ID);
        let pick = add_child(&registry, &mut parent, data::PICK_FLOAT_ID);

        parent.connections.push(Connection::new(
            SlotRef::new(a, math::ADD_RESULT),
            SlotRef::new(pick, data::PICK_FLOAT_VALUES),
        ));
        let conn = Connection::new(
            SlotRef::new(b, math::ADD_RESULT),
            SlotRef::new(pick, data::PICK_FLOAT_VALUES),
        );
        assert!(validate_connection(&registry, &parent, &conn).is_ok());
    }

    #[test]
    fn test_cycle_detection() {
        let (registry, mut parent) = setup();
        let a = add_child(&registry, &mut parent, math::ADD_ID);
        let b = add_child(&registry, &mut parent, math::ADD_ID);

        // A → B
        parent.connections.push(Connection::new(
            SlotRef::new(a, math::ADD_RESULT),
            SlotRef::new(b, math::ADD_INPUT_1),
        ));

        // Try to add B → A (would create cycle)
        let cyclic = Connection::new(
            SlotRef::new(b, math::ADD_RESULT),
            SlotRef::new(a, math::ADD_INPUT_1),
        );
        let result = validate_connection(&registry, &parent, &cyclic);
        assert!(result.unwrap_err().to_string().contains("cycle"));
    }

    #[test]
    fn test_unknown_child_rejected() {
        let (registry, parent) = setup();
        let conn = Connection::new(
            SlotRef::new(Uuid::new_v4(), math::ADD_RESULT),
            SlotRef::new(Uuid::new_v4(), math::ADD_INPUT_1),
        );
        assert!(matches!(
            validate_connection(&registry, &parent, &conn),
            Err(LibraryError::ChildNotFound { .. })
        ));
    }
}
