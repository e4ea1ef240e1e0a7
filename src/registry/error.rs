//! Registry error types

use thiserror::Error;

use super::ComponentKind;

/// Errors returned by registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} named \"{name}\" already exists")]
    DuplicateName { kind: ComponentKind, name: String },

    #[error("{kind} registry is full (capacity {capacity})")]
    CapacityExceeded { kind: ComponentKind, capacity: usize },

    #[error("{kind} id {id} is out of range (capacity {capacity})")]
    InvalidId {
        kind: ComponentKind,
        id: u32,
        capacity: usize,
    },
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
