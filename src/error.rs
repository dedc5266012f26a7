//!
//! Defines error types for the permission engine and its persistence boundary.

use crate::types::{PrincipalId, RoleId};

/// Errors raised synchronously at the API boundary.
///
/// An unmatched path is never an error: resolution falls back to "not granted".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The path argument was empty or whitespace only.
    #[error("Permission path is empty")]
    EmptyPath,
    /// The path argument could not be used as a permission node.
    #[error("Malformed permission path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },
    /// A role with this id is already registered.
    #[error("Role id already in use: {0}")]
    DuplicateRole(RoleId),
    /// Another role already uses this name (names compare case-insensitively).
    #[error("Role name already in use: {0:?}")]
    DuplicateRoleName(String),
    /// The role name was empty or whitespace only.
    #[error("Role name is empty")]
    EmptyRoleName,
    /// A principal with this id is already registered.
    #[error("Principal id already in use: {0}")]
    DuplicatePrincipal(PrincipalId),
    /// The role id is not registered.
    #[error("Role is not registered: {0}")]
    UnknownRole(RoleId),
    /// The principal id is not registered.
    #[error("Principal is not registered: {0}")]
    UnknownPrincipal(PrincipalId),
    /// Linking the parent would make the role chain cyclic.
    #[error("Parent link would create a cycle: {0}")]
    ParentCycle(String),
}

/// Error reported by a [`PersistSink`](crate::registry::PersistSink).
///
/// The registry logs these and carries on; the in-memory mutation stands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    #[error("Persistence backend unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to encode record: {0}")]
    Encoding(String),
    #[error("Persistence error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        PersistError::Encoding(err.to_string())
    }
}

/// Error raised while reading a [`RegistryConfig`](crate::config::RegistryConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid registry config: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

pub type PermissionResult<T> = Result<T, PermissionError>;
