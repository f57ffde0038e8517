//! Registry of operator types.
//!
//! Every atomic operator registers its [`Symbol`] together with an
//! [`OperatorFactory`]; composite symbols are registered without one. The
//! registry is built explicitly and passed to whoever needs it, there is no
//! process-wide instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, error};
use uuid::Uuid;

use crate::error::LibraryError;
use crate::evaluation::{UpdateAction, UpdateContext};
use crate::model::connection::Connection;
use crate::model::graph_analysis::validate_connection;
use crate::model::symbol::Symbol;
use crate::model::symbol_child::{Input, SymbolChild};
use crate::plugin::node_definitions::BuiltinOperatorPlugin;
use crate::plugin::traits::OperatorPlugin;

/// Update functions of one operator instance, keyed by output definition id.
#[derive(Default)]
pub struct OperatorBehavior {
    actions: HashMap<Uuid, UpdateAction>,
}

impl OperatorBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(
        mut self,
        output_definition_id: Uuid,
        action: impl Fn(&mut UpdateContext<'_>) -> Result<(), LibraryError> + Send + Sync + 'static,
    ) -> Self {
        self.actions.insert(output_definition_id, Arc::new(action));
        self
    }

    pub fn action(&self, output_definition_id: Uuid) -> Option<UpdateAction> {
        self.actions.get(&output_definition_id).cloned()
    }
}

impl fmt::Debug for OperatorBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorBehavior")
            .field("outputs", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Creates the behavior of one new instance. Called once per instance, so
/// per-instance state lives in the returned closures.
pub type OperatorFactory = Arc<dyn Fn() -> OperatorBehavior + Send + Sync>;

#[derive(Default)]
pub struct OperatorRegistry {
    symbols: HashMap<Uuid, Symbol>,
    factories: HashMap<Uuid, OperatorFactory>,
    names: HashMap<String, Uuid>,
    plugins: Vec<&'static str>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in operator.
    pub fn with_builtin_operators() -> Self {
        let mut registry = Self::new();
        if let Err(err) = registry.register_plugin(&BuiltinOperatorPlugin) {
            error!("Failed to register built-in operators: {}", err);
        }
        registry
    }

    pub fn register_plugin(&mut self, plugin: &dyn OperatorPlugin) -> Result<(), LibraryError> {
        plugin.register_operators(self)?;
        self.plugins.push(plugin.id());
        debug!(
            "Registered operator plugin {} v{:?}",
            plugin.name(),
            plugin.version()
        );
        Ok(())
    }

    pub fn plugin_ids(&self) -> &[&'static str] {
        &self.plugins
    }

    /// Register an atomic operator.
    pub fn register_operator(
        &mut self,
        symbol: Symbol,
        factory: impl Fn() -> OperatorBehavior + Send + Sync + 'static,
    ) -> Result<(), LibraryError> {
        let id = symbol.id;
        self.insert_symbol(symbol)?;
        self.factories.insert(id, Arc::new(factory));
        Ok(())
    }

    /// Register a composite symbol (no factory).
    pub fn register_symbol(&mut self, symbol: Symbol) -> Result<(), LibraryError> {
        self.insert_symbol(symbol)
    }

    fn insert_symbol(&mut self, symbol: Symbol) -> Result<(), LibraryError> {
        if self.symbols.contains_key(&symbol.id) {
            return Err(LibraryError::DuplicateId(symbol.id));
        }
        if self.names.contains_key(&symbol.name) {
            return Err(LibraryError::runtime(format!(
                "Symbol name {} is already registered",
                symbol.name
            )));
        }
        debug!("Registered symbol {} ({})", symbol.name, symbol.id);
        self.names.insert(symbol.name.clone(), symbol.id);
        self.symbols.insert(symbol.id, symbol);
        Ok(())
    }

    pub fn symbol(&self, id: Uuid) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    /// Mutable access for definition edits.
    pub fn symbol_mut(&mut self, id: Uuid) -> Option<&mut Symbol> {
        self.symbols.get_mut(&id)
    }

    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.names.get(name).and_then(|id| self.symbols.get(id))
    }

    /// Factory of an atomic operator; `None` for composites.
    pub fn factory(&self, id: Uuid) -> Option<OperatorFactory> {
        self.factories.get(&id).cloned()
    }

    /// All symbols, sorted by name.
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.symbols.values().collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        symbols
    }

    // -----------------------------------------------------------------------
    // Composite editing
    // -----------------------------------------------------------------------

    /// Place a new child of `symbol_id` inside the composite `parent`.
    pub fn add_child(&mut self, parent: Uuid, symbol_id: Uuid) -> Result<Uuid, LibraryError> {
        let symbol = self
            .symbols
            .get(&symbol_id)
            .ok_or(LibraryError::SymbolNotFound(symbol_id))?;
        let child = SymbolChild::new(symbol, Uuid::new_v4());
        let id = child.id;
        self.insert_child(parent, child)?;
        Ok(id)
    }

    /// Place an existing symbol child inside the composite `parent`.
    pub fn insert_child(&mut self, parent: Uuid, child: SymbolChild) -> Result<(), LibraryError> {
        if !self.symbols.contains_key(&child.symbol_id) {
            return Err(LibraryError::SymbolNotFound(child.symbol_id));
        }
        if self.contains_symbol(child.symbol_id, parent) {
            return Err(LibraryError::runtime(format!(
                "Symbol {} cannot contain itself",
                parent
            )));
        }
        let parent_symbol = self
            .symbols
            .get_mut(&parent)
            .ok_or(LibraryError::SymbolNotFound(parent))?;
        if !parent_symbol.is_composite() {
            return Err(LibraryError::runtime(format!(
                "Symbol {} is not a composite",
                parent_symbol.name
            )));
        }
        if parent_symbol.child(child.id).is_some() {
            return Err(LibraryError::DuplicateId(child.id));
        }
        debug!("Added child {} to {}", child.id, parent_symbol.name);
        parent_symbol.children.push(child);
        Ok(())
    }

    /// Remove a child and every connection touching it.
    pub fn remove_child(&mut self, parent: Uuid, child_id: Uuid) -> Result<SymbolChild, LibraryError> {
        let parent_symbol = self
            .symbols
            .get_mut(&parent)
            .ok_or(LibraryError::SymbolNotFound(parent))?;
        let index = parent_symbol
            .children
            .iter()
            .position(|c| c.id == child_id)
            .ok_or(LibraryError::ChildNotFound {
                symbol: parent,
                child: child_id,
            })?;
        parent_symbol.connections.retain(|c| !c.touches_child(child_id));
        Ok(parent_symbol.children.remove(index))
    }

    /// Validate and add a connection to the composite `parent`.
    pub fn add_connection(&mut self, parent: Uuid, conn: Connection) -> Result<(), LibraryError> {
        let parent_symbol = self
            .symbols
            .get(&parent)
            .ok_or(LibraryError::SymbolNotFound(parent))?;
        validate_connection(self, parent_symbol, &conn)?;

        if let Some(parent_symbol) = self.symbols.get_mut(&parent) {
            // Multi-input ordinals index the connections feeding the same target.
            match conn.multi_input_index {
                Some(index) => {
                    let position = parent_symbol
                        .connections
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| c.target == conn.target)
                        .nth(index)
                        .map(|(i, _)| i)
                        .unwrap_or(parent_symbol.connections.len());
                    parent_symbol.connections.insert(position, conn);
                }
                None => parent_symbol.connections.push(conn),
            }
        }
        Ok(())
    }

    pub fn remove_connection(&mut self, parent: Uuid, conn: &Connection) -> Result<(), LibraryError> {
        let parent_symbol = self
            .symbols
            .get_mut(&parent)
            .ok_or(LibraryError::SymbolNotFound(parent))?;
        let same_endpoints = |c: &Connection| c.source == conn.source && c.target == conn.target;
        // The same source may feed a multi-input twice; the ordinal picks which.
        let by_ordinal = conn.multi_input_index.and_then(|index| {
            parent_symbol
                .connections
                .iter()
                .enumerate()
                .filter(|(_, c)| c.target == conn.target)
                .nth(index)
                .filter(|(_, c)| same_endpoints(c))
                .map(|(i, _)| i)
        });
        let index = by_ordinal
            .or_else(|| parent_symbol.connections.iter().position(|c| same_endpoints(c)))
            .ok_or_else(|| LibraryError::invalid_connection("Connection not found"))?;
        parent_symbol.connections.remove(index);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Input defaults
    // -----------------------------------------------------------------------

    /// Make a child's current input value the shared default of its definition.
    pub fn set_current_value_as_default(
        &mut self,
        parent: Uuid,
        child_id: Uuid,
        input_id: Uuid,
    ) -> Result<(), LibraryError> {
        let child_symbol_id = self.child(parent, child_id)?.symbol_id;
        let mut definition = self
            .symbols
            .get(&child_symbol_id)
            .ok_or(LibraryError::SymbolNotFound(child_symbol_id))?
            .input_definition(input_id)
            .ok_or(LibraryError::DefinitionNotFound(input_id))?
            .clone();

        self.child_input_mut(parent, child_id, input_id)?
            .set_current_value_as_default(&mut definition);

        if let Some(target) = self
            .symbols
            .get_mut(&child_symbol_id)
            .and_then(|s| s.input_definition_mut(input_id))
        {
            *target = definition;
        }
        Ok(())
    }

    pub fn reset_to_default(&mut self, parent: Uuid, child_id: Uuid, input_id: Uuid) -> Result<(), LibraryError> {
        let child_symbol_id = self.child(parent, child_id)?.symbol_id;
        let definition = self
            .symbols
            .get(&child_symbol_id)
            .ok_or(LibraryError::SymbolNotFound(child_symbol_id))?
            .input_definition(input_id)
            .ok_or(LibraryError::DefinitionNotFound(input_id))?
            .clone();
        self.child_input_mut(parent, child_id, input_id)?
            .reset_to_default(&definition);
        Ok(())
    }

    fn child(&self, parent: Uuid, child_id: Uuid) -> Result<&SymbolChild, LibraryError> {
        self.symbols
            .get(&parent)
            .ok_or(LibraryError::SymbolNotFound(parent))?
            .child(child_id)
            .ok_or(LibraryError::ChildNotFound {
                symbol: parent,
                child: child_id,
            })
    }

    fn child_input_mut(
        &mut self,
        parent: Uuid,
        child_id: Uuid,
        input_id: Uuid,
    ) -> Result<&mut Input, LibraryError> {
        self.symbols
            .get_mut(&parent)
            .ok_or(LibraryError::SymbolNotFound(parent))?
            .child_mut(child_id)
            .ok_or(LibraryError::ChildNotFound {
                symbol: parent,
                child: child_id,
            })?
            .input_mut(input_id)
            .ok_or(LibraryError::DefinitionNotFound(input_id))
    }

    /// Whether `symbol_id` is `target` or (transitively) contains it.
    fn contains_symbol(&self, symbol_id: Uuid, target: Uuid) -> bool {
        if symbol_id == target {
            return true;
        }
        self.symbols.get(&symbol_id).is_some_and(|symbol| {
            symbol
                .children
                .iter()
                .any(|c| self.contains_symbol(c.symbol_id, target))
        })
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("symbols", &self.symbols.len())
            .field("operators", &self.factories.len())
            .field("plugins", &self.plugins)
            .finish()
    }
}
