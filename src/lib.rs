#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Sledge-Perms is a hierarchical permission-node resolution engine.
//!
//! Given a principal (an individual account, or the role it is assigned to)
//! and a dotted permission path such as `server.kick.vote`, it decides whether
//! the action is authorized. Resolution is fail-closed: with no related
//! assertion anywhere in the chain the answer is "not granted".
//!
//! The engine performs no I/O. Hosts supply ids and paths, and receive
//! records through a [`PersistSink`](registry::PersistSink) when a mutation
//! asks to be made durable.

// Identifier newtypes shared by every module.
pub mod types;

// Error types.
pub mod error;

// Path normalization, validation, relatedness and the parsing helper.
pub mod assertion;

// Assertion sets, roles and principals.
pub mod access;

// Registry configuration.
pub mod config;

// Lock-guarded graph, cascading deletes, loading and queries.
pub mod registry;

// Administrator bypass at the calling boundary.
pub mod gate;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use access::{AssertionSet, Principal, PrincipalRecord, Role, RoleLookup, RoleRecord};
pub use assertion::Assertion;
pub use config::RegistryConfig;
pub use error::{ConfigError, PermissionError, PermissionResult, PersistError};
pub use gate::Gatekeeper;
pub use registry::{LoadReport, NoopSink, PersistSink, Registry, Snapshot};
pub use types::{PrincipalId, RoleId};

/// Installs a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "log-subscriber")]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
