//! Roles: an assertion set plus an optional parent link and the member
//! back-references.
//!
//! A role never owns its parent. The link is an id resolved through a
//! [`RoleLookup`] (normally the registry graph), which keeps lifetimes out of
//! any cycle that bad data might form.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::BuildHasher;

use crate::access::set::{self, AssertionSet, Overlay};
use crate::assertion::Assertion;
use crate::types::{PrincipalId, RoleId};

/// Resolves role ids to roles.
pub trait RoleLookup {
    fn role(&self, id: &RoleId) -> Option<&Role>;
}

impl<S: BuildHasher> RoleLookup for HashMap<RoleId, Role, S> {
    fn role(&self, id: &RoleId) -> Option<&Role> {
        self.get(id)
    }
}

/// Stored form of a role. Members are derived from principals on load.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RoleId>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: String,
    assertions: AssertionSet,
    parent: Option<RoleId>,
    members: BTreeSet<PrincipalId>,
}

impl Role {
    pub fn new(id: RoleId, name: &str) -> Self {
        Role {
            id,
            name: name.trim().to_string(),
            assertions: AssertionSet::new(),
            parent: None,
            members: BTreeSet::new(),
        }
    }

    pub fn from_record(record: RoleRecord) -> Self {
        Role {
            id: record.id,
            name: record.name.trim().to_string(),
            assertions: AssertionSet::from_assertions(record.assertions),
            parent: record.parent,
            members: BTreeSet::new(),
        }
    }

    pub fn to_record(&self) -> RoleRecord {
        RoleRecord {
            id: self.id,
            name: self.name.clone(),
            parent: self.parent,
            assertions: self.assertions.to_sorted_vec(),
        }
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<RoleId> {
        self.parent
    }

    pub fn members(&self) -> &BTreeSet<PrincipalId> {
        &self.members
    }

    pub fn has_member(&self, principal: &PrincipalId) -> bool {
        self.members.contains(principal)
    }

    pub fn assertions(&self) -> &AssertionSet {
        &self.assertions
    }

    pub(crate) fn assertions_mut(&mut self) -> &mut AssertionSet {
        &mut self.assertions
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    pub(crate) fn set_parent_ref(&mut self, parent: Option<RoleId>) {
        self.parent = parent;
    }

    pub(crate) fn insert_member(&mut self, principal: PrincipalId) -> bool {
        self.members.insert(principal)
    }

    pub(crate) fn remove_member_ref(&mut self, principal: &PrincipalId) -> bool {
        self.members.remove(principal)
    }

    /// Closest assertion from this role's own set.
    pub fn closest(&self, path: &str) -> Option<&Assertion> {
        self.assertions.closest(path)
    }

    /// Point query: this role's own set layered over its parent's own set.
    ///
    /// Only one level of inheritance is consulted. The grandparent is never
    /// read here, unlike [`Role::descendants_granted`].
    pub fn is_authorized(&self, parent: Option<&Role>, path: &str) -> bool {
        let inherited = parent.and_then(|p| p.closest(path));
        set::resolve_layers(self.closest(path), inherited)
            .map(Assertion::is_granted)
            .unwrap_or(false)
    }

    /// This role followed by each ancestor, nearest first.
    ///
    /// The walk stops at a missing id, at a role already visited, or after
    /// `max_depth` links.
    pub fn chain<'a, L: RoleLookup + ?Sized>(&'a self, lookup: &'a L, max_depth: usize) -> Vec<&'a Role> {
        let mut chain = vec![self];
        let mut seen: HashSet<RoleId> = HashSet::from([self.id]);
        let mut next = self.parent;
        while let Some(id) = next {
            if chain.len() > max_depth {
                tracing::warn!(role = %self.id, max_depth, "parent chain truncated at depth limit");
                break;
            }
            if !seen.insert(id) {
                tracing::warn!(role = %self.id, revisited = %id, "parent chain loops; stopping walk");
                break;
            }
            match lookup.role(&id) {
                Some(role) => {
                    chain.push(role);
                    next = role.parent;
                }
                None => {
                    tracing::warn!(role = %self.id, missing = %id, "parent chain references unknown role");
                    break;
                }
            }
        }
        chain
    }

    /// Descendants of `root` across the full ancestor chain.
    ///
    /// Each level is written over the levels above it, keyed by path.
    pub fn collect_descendants<L: RoleLookup + ?Sized>(&self, lookup: &L, root: &str, max_depth: usize) -> Overlay {
        let mut overlay = Overlay::new();
        for role in self.chain(lookup, max_depth).into_iter().rev() {
            role.assertions.overlay_descendants(root, &mut overlay);
        }
        overlay
    }

    /// Wildcard query: is anything strictly beneath `root` granted anywhere in
    /// the full ancestor chain, after local overrides.
    pub fn descendants_granted<L: RoleLookup + ?Sized>(&self, lookup: &L, root: &str, max_depth: usize) -> bool {
        set::any_granted(&self.collect_descendants(lookup, root, max_depth))
    }
}
