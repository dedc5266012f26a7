//! Persistence collaborator.
//!
//! The registry never performs I/O itself. When a mutation is made with
//! `persist = true`, the affected records are handed to a `PersistSink`
//! synchronously, while the registry's write lock is still held, so a sink
//! always observes records in mutation order. Sink failures are logged and
//! never roll back the in-memory change.
//!
//! `NoopSink` discards everything; suitable for tests and memory-only hosts.

use std::sync::Arc;

use crate::access::{PrincipalRecord, RoleRecord};
use crate::error::PersistError;
use crate::types::{PrincipalId, RoleId};

/// Receives records that must be made durable.
pub trait PersistSink: Send + Sync + 'static {
    fn save_role(&self, role: &RoleRecord) -> Result<(), PersistError>;

    fn save_principal(&self, principal: &PrincipalRecord) -> Result<(), PersistError>;

    fn delete_role(&self, id: RoleId) -> Result<(), PersistError>;

    fn delete_principal(&self, id: PrincipalId) -> Result<(), PersistError>;
}

/// Sink that drops every request.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoopSink;

impl PersistSink for NoopSink {
    fn save_role(&self, _role: &RoleRecord) -> Result<(), PersistError> {
        Ok(())
    }

    fn save_principal(&self, _principal: &PrincipalRecord) -> Result<(), PersistError> {
        Ok(())
    }

    fn delete_role(&self, _id: RoleId) -> Result<(), PersistError> {
        Ok(())
    }

    fn delete_principal(&self, _id: PrincipalId) -> Result<(), PersistError> {
        Ok(())
    }
}

// Lets a host keep its own handle on the sink it gave the registry.
impl<S: PersistSink + ?Sized> PersistSink for Arc<S> {
    fn save_role(&self, role: &RoleRecord) -> Result<(), PersistError> {
        (**self).save_role(role)
    }

    fn save_principal(&self, principal: &PrincipalRecord) -> Result<(), PersistError> {
        (**self).save_principal(principal)
    }

    fn delete_role(&self, id: RoleId) -> Result<(), PersistError> {
        (**self).delete_role(id)
    }

    fn delete_principal(&self, id: PrincipalId) -> Result<(), PersistError> {
        (**self).delete_principal(id)
    }
}
