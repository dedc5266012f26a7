//! Calling-boundary wrapper that applies the administrator bypass.
//!
//! The registry is fail-closed and knows nothing about administrators. Hosts
//! that want "administrators may do anything" put a `Gatekeeper` in front of
//! it, so the engine stays testable without the bypass.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PermissionResult;
use crate::registry::{NoopSink, PersistSink, Registry};
use crate::types::PrincipalId;

pub struct Gatekeeper<S: PersistSink = NoopSink> {
    registry: Arc<Registry<S>>,
    administrators: RwLock<HashSet<PrincipalId>>,
}

impl<S: PersistSink> Gatekeeper<S> {
    pub fn new(registry: Arc<Registry<S>>) -> Self {
        Gatekeeper { registry, administrators: RwLock::new(HashSet::new()) }
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.registry
    }

    /// Marks or unmarks a principal as an administrator. Returns whether the
    /// flag changed.
    pub fn set_administrator(&self, principal: PrincipalId, admin: bool) -> bool {
        let mut admins = self.administrators.write();
        if admin {
            admins.insert(principal)
        } else {
            admins.remove(&principal)
        }
    }

    pub fn is_administrator(&self, principal: &PrincipalId) -> bool {
        self.administrators.read().contains(principal)
    }

    /// Administrators pass every check; everyone else is resolved by the
    /// registry. Malformed queries are rejected for everyone.
    pub fn check(&self, principal: PrincipalId, query: &str) -> PermissionResult<bool> {
        let (root, _) = self.registry.config().split_query(query);
        crate::assertion::validate(root)?;
        if self.is_administrator(&principal) {
            tracing::trace!(%principal, query, "administrator bypass");
            return Ok(true);
        }
        self.registry.has_permission(principal, query)
    }
}
