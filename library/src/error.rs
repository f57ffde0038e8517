use thiserror::Error;
use uuid::Uuid;

use crate::model::value::ValueType;
use crate::runtime::{InstanceId, SlotId};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Symbol not found: {0}")]
    SymbolNotFound(Uuid),
    #[error("Instance not found: {0}")]
    InstanceNotFound(InstanceId),
    #[error("Slot not found: {0}")]
    SlotNotFound(SlotId),
    #[error("Child {child} not found in symbol {symbol}")]
    ChildNotFound { symbol: Uuid, child: Uuid },
    #[error("Definition {0} not found")]
    DefinitionNotFound(Uuid),
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ValueType, found: ValueType },
    #[error("Duplicate id: {0}")]
    DuplicateId(Uuid),
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),
    #[error("Cyclic evaluation detected at slot {0}")]
    CyclicEvaluation(SlotId),
    #[error("Update of slot {slot} failed: {message}")]
    UpdateFailed { slot: SlotId, message: String },
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl LibraryError {
    pub fn runtime(msg: impl Into<String>) -> Self {
        LibraryError::Runtime(msg.into())
    }

    pub fn invalid_connection(msg: impl Into<String>) -> Self {
        LibraryError::InvalidConnection(msg.into())
    }
}
