//! Helpers for tests that need to observe persistence requests.
//!
//! Compiled only with the `test-utils` feature (or under `cfg(test)`).

use parking_lot::Mutex;

use crate::access::{PrincipalRecord, RoleRecord};
use crate::error::PersistError;
use crate::registry::PersistSink;
use crate::types::{PrincipalId, RoleId};

/// One request received by a [`RecordingSink`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCall {
    SaveRole(RoleRecord),
    SavePrincipal(PrincipalRecord),
    DeleteRole(RoleId),
    DeletePrincipal(PrincipalId),
}

/// Sink that remembers every call. Optionally fails every call after
/// recording it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<PersistCall>>,
    fail_with: Option<PersistError>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(err: PersistError) -> Self {
        RecordingSink { calls: Mutex::new(Vec::new()), fail_with: Some(err) }
    }

    pub fn calls(&self) -> Vec<PersistCall> {
        self.calls.lock().clone()
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<PersistCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    fn record(&self, call: PersistCall) -> Result<(), PersistError> {
        self.calls.lock().push(call);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl PersistSink for RecordingSink {
    fn save_role(&self, role: &RoleRecord) -> Result<(), PersistError> {
        self.record(PersistCall::SaveRole(role.clone()))
    }

    fn save_principal(&self, principal: &PrincipalRecord) -> Result<(), PersistError> {
        self.record(PersistCall::SavePrincipal(principal.clone()))
    }

    fn delete_role(&self, id: RoleId) -> Result<(), PersistError> {
        self.record(PersistCall::DeleteRole(id))
    }

    fn delete_principal(&self, id: PrincipalId) -> Result<(), PersistError> {
        self.record(PersistCall::DeletePrincipal(id))
    }
}
