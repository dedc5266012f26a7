//! Principals: an individual account's own assertion set plus an optional
//! role reference.

use crate::access::role::{Role, RoleLookup};
use crate::access::set::{self, AssertionSet};
use crate::assertion::Assertion;
use crate::types::{PrincipalId, RoleId};

/// Stored form of a principal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PrincipalRecord {
    pub id: PrincipalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleId>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: PrincipalId,
    assertions: AssertionSet,
    role: Option<RoleId>,
}

impl Principal {
    pub fn new(id: PrincipalId) -> Self {
        Principal { id, assertions: AssertionSet::new(), role: None }
    }

    pub fn from_record(record: PrincipalRecord) -> Self {
        Principal {
            id: record.id,
            assertions: AssertionSet::from_assertions(record.assertions),
            role: record.role,
        }
    }

    pub fn to_record(&self) -> PrincipalRecord {
        PrincipalRecord {
            id: self.id,
            role: self.role,
            assertions: self.assertions.to_sorted_vec(),
        }
    }

    pub fn id(&self) -> PrincipalId {
        self.id
    }

    pub fn role(&self) -> Option<RoleId> {
        self.role
    }

    pub fn assertions(&self) -> &AssertionSet {
        &self.assertions
    }

    pub(crate) fn assertions_mut(&mut self) -> &mut AssertionSet {
        &mut self.assertions
    }

    pub(crate) fn set_role_ref(&mut self, role: Option<RoleId>) {
        self.role = role;
    }

    pub fn closest(&self, path: &str) -> Option<&Assertion> {
        self.assertions.closest(path)
    }

    /// Point query: own set layered over the role's own set (one level).
    pub fn is_authorized(&self, role: Option<&Role>, path: &str) -> bool {
        let inherited = role.and_then(|r| r.closest(path));
        set::resolve_layers(self.closest(path), inherited)
            .map(Assertion::is_granted)
            .unwrap_or(false)
    }

    /// Wildcard query: own descendants of `root` written over everything the
    /// role's full ancestor chain collects.
    pub fn descendants_granted<L: RoleLookup + ?Sized>(&self, lookup: &L, root: &str, max_depth: usize) -> bool {
        let mut overlay = match self.role.and_then(|id| lookup.role(&id)) {
            Some(role) => role.collect_descendants(lookup, root, max_depth),
            None => set::Overlay::new(),
        };
        self.assertions.overlay_descendants(root, &mut overlay);
        set::any_granted(&overlay)
    }
}
