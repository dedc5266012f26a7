//!
//! The registry: owns every role and principal behind one coarse lock,
//! enforces id and name uniqueness, keeps membership back-references
//! consistent, and performs the cascading reassignment on role deletion.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::access::{Principal, PrincipalRecord, Role, RoleLookup, RoleRecord};
use crate::assertion::{self, Assertion};
use crate::config::RegistryConfig;
use crate::error::{PermissionError, PermissionResult};
use crate::registry::persist::{NoopSink, PersistSink};
use crate::types::{PrincipalId, RoleId};

/// Full stored state, as produced by [`Registry::export`] and consumed by
/// [`Registry::load_snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    pub roles: Vec<RoleRecord>,
    pub principals: Vec<PrincipalRecord>,
}

/// Outcome of [`Registry::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub roles: usize,
    pub principals: usize,
    /// Roles whose parent id did not resolve; their parent was cleared.
    pub repaired_roles: Vec<RoleId>,
    /// Principals whose role id did not resolve; their role was cleared.
    pub repaired_principals: Vec<PrincipalId>,
}

/// Case-folded form used for every role-name comparison.
fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Everything guarded by the registry lock.
#[derive(Debug)]
struct Graph {
    roles: HashMap<RoleId, Role>,
    principals: HashMap<PrincipalId, Principal>,
    default_role: Role,
}

impl RoleLookup for Graph {
    fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }
}

impl Graph {
    fn new(default_role_name: &str) -> Self {
        Graph {
            roles: HashMap::new(),
            principals: HashMap::new(),
            default_role: Role::new(RoleId(Uuid::nil()), default_role_name),
        }
    }

    fn role_ref(&self, id: RoleId) -> PermissionResult<&Role> {
        self.roles.get(&id).ok_or(PermissionError::UnknownRole(id))
    }

    fn role_mut(&mut self, id: RoleId) -> PermissionResult<&mut Role> {
        self.roles.get_mut(&id).ok_or(PermissionError::UnknownRole(id))
    }

    fn principal_ref(&self, id: PrincipalId) -> PermissionResult<&Principal> {
        self.principals.get(&id).ok_or(PermissionError::UnknownPrincipal(id))
    }

    fn principal_mut(&mut self, id: PrincipalId) -> PermissionResult<&mut Principal> {
        self.principals.get_mut(&id).ok_or(PermissionError::UnknownPrincipal(id))
    }

    fn find_role_by_name(&self, name: &str) -> Option<&Role> {
        let wanted = fold_name(name);
        self.roles.values().find(|r| fold_name(r.name()) == wanted)
    }

    /// Name must be non-empty and unused by any role other than `except`.
    fn check_role_name(&self, name: &str, except: Option<RoleId>) -> PermissionResult<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PermissionError::EmptyRoleName);
        }
        if fold_name(trimmed) == fold_name(self.default_role.name()) {
            return Err(PermissionError::DuplicateRoleName(trimmed.to_string()));
        }
        match self.find_role_by_name(trimmed) {
            Some(existing) if Some(existing.id()) != except => {
                Err(PermissionError::DuplicateRoleName(trimmed.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Rejects `child -> parent` if `child` already appears above `parent`.
    fn check_parent_link(&self, child: RoleId, parent: RoleId) -> PermissionResult<()> {
        let mut walked = vec![child];
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            walked.push(id);
            if id == child {
                return Err(PermissionError::ParentCycle(self.describe_chain(&walked)));
            }
            if walked.len() > self.roles.len() + 1 {
                break;
            }
            cursor = self.roles.get(&id).and_then(Role::parent);
        }
        Ok(())
    }

    /// Finds any loop in the parent links, reporting the first one found.
    fn check_acyclic(&self) -> PermissionResult<()> {
        let mut cleared: HashSet<RoleId> = HashSet::new();
        let mut ids: Vec<RoleId> = self.roles.keys().copied().collect();
        ids.sort_unstable();
        for start in ids {
            let mut walked: Vec<RoleId> = Vec::new();
            let mut cursor = Some(start);
            while let Some(id) = cursor {
                if cleared.contains(&id) {
                    break;
                }
                if let Some(pos) = walked.iter().position(|w| *w == id) {
                    let mut cycle = walked[pos..].to_vec();
                    cycle.push(id);
                    return Err(PermissionError::ParentCycle(self.describe_chain(&cycle)));
                }
                walked.push(id);
                cursor = self.roles.get(&id).and_then(Role::parent);
            }
            cleared.extend(walked);
        }
        Ok(())
    }

    fn describe_chain(&self, ids: &[RoleId]) -> String {
        ids.iter()
            .map(|id| match self.roles.get(id) {
                Some(role) => role.name().to_string(),
                None => id.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Moves `principal` to `role`, keeping both member sets in step.
    fn relink(&mut self, principal: PrincipalId, role: Option<RoleId>) -> PermissionResult<()> {
        if let Some(id) = role {
            self.role_ref(id)?;
        }
        let previous = self.principal_ref(principal)?.role();
        if let Some(old) = previous.and_then(|id| self.roles.get_mut(&id)) {
            old.remove_member_ref(&principal);
        }
        if let Some(new) = role.and_then(|id| self.roles.get_mut(&id)) {
            new.insert_member(principal);
        }
        self.principal_mut(principal)?.set_role_ref(role);
        Ok(())
    }
}

/// Thread-safe home of the permission graph.
///
/// Queries take the read lock; every mutation, including the multi-step
/// cascading delete, takes the write lock once for its whole duration.
pub struct Registry<S: PersistSink = NoopSink> {
    graph: RwLock<Graph>,
    sink: S,
    config: RegistryConfig,
}

impl<S: PersistSink> std::fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.graph.read();
        f.debug_struct("Registry")
            .field("roles", &graph.roles.len())
            .field("principals", &graph.principals.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Registry<NoopSink> {
    /// Memory-only registry with default configuration.
    pub fn new_with_default_sink() -> Self {
        Self::new(RegistryConfig::default(), NoopSink)
    }
}

impl<S: PersistSink> Registry<S> {
    pub fn new(config: RegistryConfig, sink: S) -> Self {
        Registry {
            graph: RwLock::new(Graph::new(&config.default_role_name)),
            sink,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // --- persistence helpers (called with the write lock held) -------------

    fn persist_role(&self, graph: &Graph, id: RoleId) {
        if let Some(role) = graph.roles.get(&id) {
            if let Err(err) = self.sink.save_role(&role.to_record()) {
                tracing::warn!(role = %id, error = %err, "failed to persist role");
            }
        }
    }

    fn persist_principal(&self, graph: &Graph, id: PrincipalId) {
        if let Some(principal) = graph.principals.get(&id) {
            if let Err(err) = self.sink.save_principal(&principal.to_record()) {
                tracing::warn!(principal = %id, error = %err, "failed to persist principal");
            }
        }
    }

    // --- loading ------------------------------------------------------------

    /// Replaces the whole graph with stored records.
    ///
    /// Roles are installed first, then principals, then principals are
    /// linked to their roles. Dangling parent or role references are cleared
    /// and the repaired records handed to the sink. A duplicate id or name,
    /// or a cyclic parent chain, rejects the load and leaves the current
    /// graph untouched.
    pub fn load(&self, roles: Vec<RoleRecord>, principals: Vec<PrincipalRecord>) -> PermissionResult<LoadReport> {
        let mut fresh = Graph::new(&self.config.default_role_name);
        let mut report = LoadReport::default();

        for record in roles {
            let id = record.id;
            if fresh.roles.contains_key(&id) {
                return Err(PermissionError::DuplicateRole(id));
            }
            fresh.check_role_name(&record.name, None)?;
            fresh.roles.insert(id, Role::from_record(record));
        }

        let dangling: Vec<RoleId> = fresh
            .roles
            .values()
            .filter(|r| r.parent().is_some_and(|p| !fresh.roles.contains_key(&p)))
            .map(Role::id)
            .collect();
        for id in dangling {
            let role = fresh.role_mut(id)?;
            tracing::warn!(role = %id, parent = ?role.parent(), "role references unknown parent; clearing");
            role.set_parent_ref(None);
            report.repaired_roles.push(id);
        }
        fresh.check_acyclic()?;

        for record in principals {
            let id = record.id;
            if fresh.principals.contains_key(&id) {
                return Err(PermissionError::DuplicatePrincipal(id));
            }
            fresh.principals.insert(id, Principal::from_record(record));
        }

        let links: Vec<(PrincipalId, RoleId)> = fresh
            .principals
            .values()
            .filter_map(|p| p.role().map(|r| (p.id(), r)))
            .collect();
        for (principal, role) in links {
            match fresh.roles.get_mut(&role) {
                Some(r) => {
                    r.insert_member(principal);
                }
                None => {
                    tracing::warn!(%principal, %role, "principal assigned to unknown role; clearing");
                    fresh.principal_mut(principal)?.set_role_ref(None);
                    report.repaired_principals.push(principal);
                }
            }
        }

        report.roles = fresh.roles.len();
        report.principals = fresh.principals.len();

        let mut graph = self.graph.write();
        // Default-role assertions are configured by the host, not stored.
        std::mem::swap(&mut fresh.default_role, &mut graph.default_role);
        *graph = fresh;
        for id in &report.repaired_roles {
            self.persist_role(&graph, *id);
        }
        for id in &report.repaired_principals {
            self.persist_principal(&graph, *id);
        }
        tracing::info!(
            roles = report.roles,
            principals = report.principals,
            repaired_roles = report.repaired_roles.len(),
            repaired_principals = report.repaired_principals.len(),
            "permission graph loaded"
        );
        Ok(report)
    }

    pub fn load_snapshot(&self, snapshot: Snapshot) -> PermissionResult<LoadReport> {
        self.load(snapshot.roles, snapshot.principals)
    }

    /// Stored form of every role and principal, ordered by id.
    pub fn export(&self) -> Snapshot {
        let graph = self.graph.read();
        let mut roles: Vec<RoleRecord> = graph.roles.values().map(Role::to_record).collect();
        roles.sort_unstable_by_key(|r| r.id);
        let mut principals: Vec<PrincipalRecord> = graph.principals.values().map(Principal::to_record).collect();
        principals.sort_unstable_by_key(|p| p.id);
        Snapshot { roles, principals }
    }

    // --- roles --------------------------------------------------------------

    pub fn create_role(&self, id: RoleId, name: &str, persist: bool) -> PermissionResult<()> {
        let mut graph = self.graph.write();
        if graph.roles.contains_key(&id) {
            return Err(PermissionError::DuplicateRole(id));
        }
        graph.check_role_name(name, None)?;
        graph.roles.insert(id, Role::new(id, name));
        tracing::debug!(role = %id, name = name.trim(), "role created");
        if persist {
            self.persist_role(&graph, id);
        }
        Ok(())
    }

    /// Deletes a role and splices it out of the graph.
    ///
    /// Members move to the deleted role's parent (or to no role), and roles
    /// whose parent was the deleted role are re-parented to that same parent.
    pub fn delete_role(&self, id: RoleId, persist: bool) -> PermissionResult<RoleRecord> {
        let mut guard = self.graph.write();
        let graph = &mut *guard;
        let removed = graph.roles.remove(&id).ok_or(PermissionError::UnknownRole(id))?;
        let heir = removed.parent();

        let children: Vec<RoleId> = graph
            .roles
            .values()
            .filter(|r| r.parent() == Some(id))
            .map(Role::id)
            .collect();
        for child in &children {
            graph.role_mut(*child)?.set_parent_ref(heir);
        }

        for member in removed.members() {
            if let Some(p) = graph.principals.get_mut(member) {
                p.set_role_ref(heir);
            }
            if let Some(h) = heir.and_then(|h| graph.roles.get_mut(&h)) {
                h.insert_member(*member);
            }
        }

        tracing::debug!(
            role = %id,
            heir = ?heir,
            children = children.len(),
            members = removed.members().len(),
            "role deleted"
        );

        if persist {
            if let Err(err) = self.sink.delete_role(id) {
                tracing::warn!(role = %id, error = %err, "failed to delete persisted role");
            }
            for child in &children {
                self.persist_role(graph, *child);
            }
            for member in removed.members() {
                self.persist_principal(graph, *member);
            }
        }
        Ok(removed.to_record())
    }

    pub fn rename_role(&self, id: RoleId, name: &str, persist: bool) -> PermissionResult<()> {
        let mut graph = self.graph.write();
        graph.role_ref(id)?;
        graph.check_role_name(name, Some(id))?;
        graph.role_mut(id)?.set_name(name);
        if persist {
            self.persist_role(&graph, id);
        }
        Ok(())
    }

    /// Case-insensitive lookup by name.
    pub fn role_by_name(&self, name: &str) -> Option<RoleId> {
        self.graph.read().find_role_by_name(name).map(Role::id)
    }

    pub fn role(&self, id: RoleId) -> Option<RoleRecord> {
        self.graph.read().roles.get(&id).map(Role::to_record)
    }

    pub fn members(&self, id: RoleId) -> PermissionResult<Vec<PrincipalId>> {
        let graph = self.graph.read();
        Ok(graph.role_ref(id)?.members().iter().copied().collect())
    }

    pub fn role_count(&self) -> usize {
        self.graph.read().roles.len()
    }

    pub fn set_role_assertion(&self, id: RoleId, path: &str, granted: bool, persist: bool) -> PermissionResult<Assertion> {
        assertion::validate(path)?;
        let mut graph = self.graph.write();
        let stored = graph.role_mut(id)?.assertions_mut().set(path, granted)?.clone();
        tracing::debug!(role = %id, assertion = %stored, "role assertion set");
        if persist {
            self.persist_role(&graph, id);
        }
        Ok(stored)
    }

    pub fn unset_role_assertion(&self, id: RoleId, path: &str, persist: bool) -> PermissionResult<Option<Assertion>> {
        assertion::validate(path)?;
        let mut graph = self.graph.write();
        let removed = graph.role_mut(id)?.assertions_mut().unset(path)?;
        tracing::debug!(role = %id, path = %assertion::normalize(path), removed = removed.is_some(), "role assertion unset");
        if persist {
            self.persist_role(&graph, id);
        }
        Ok(removed)
    }

    /// Replaces a role's parent link. Links that would close a loop are
    /// rejected.
    pub fn set_parent(&self, id: RoleId, parent: Option<RoleId>, persist: bool) -> PermissionResult<()> {
        let mut graph = self.graph.write();
        graph.role_ref(id)?;
        if let Some(p) = parent {
            graph.role_ref(p)?;
            graph.check_parent_link(id, p)?;
        }
        graph.role_mut(id)?.set_parent_ref(parent);
        tracing::debug!(role = %id, parent = ?parent, "role parent set");
        if persist {
            self.persist_role(&graph, id);
        }
        Ok(())
    }

    /// Assigns `principal` to `role`, updating both sides in one step.
    pub fn add_member(&self, role: RoleId, principal: PrincipalId, persist: bool) -> PermissionResult<()> {
        self.set_role(principal, Some(role), persist)
    }

    /// Drops `principal` from `role`, leaving it with no role.
    ///
    /// The principal is never promoted to the role's parent; only
    /// [`Registry::delete_role`] does that. Returns `false` when the
    /// principal was not a member of `role`, in which case nothing changes.
    pub fn remove_member(&self, role: RoleId, principal: PrincipalId, persist: bool) -> PermissionResult<bool> {
        let mut graph = self.graph.write();
        graph.role_ref(role)?;
        if graph.principal_ref(principal)?.role() != Some(role) {
            return Ok(false);
        }
        graph.relink(principal, None)?;
        tracing::debug!(%role, %principal, "member removed");
        if persist {
            self.persist_principal(&graph, principal);
        }
        Ok(true)
    }

    // --- principals ---------------------------------------------------------

    pub fn create_principal(&self, id: PrincipalId, persist: bool) -> PermissionResult<()> {
        let mut graph = self.graph.write();
        if graph.principals.contains_key(&id) {
            return Err(PermissionError::DuplicatePrincipal(id));
        }
        graph.principals.insert(id, Principal::new(id));
        tracing::debug!(principal = %id, "principal created");
        if persist {
            self.persist_principal(&graph, id);
        }
        Ok(())
    }

    pub fn delete_principal(&self, id: PrincipalId, persist: bool) -> PermissionResult<PrincipalRecord> {
        let mut graph = self.graph.write();
        let removed = graph.principals.remove(&id).ok_or(PermissionError::UnknownPrincipal(id))?;
        if let Some(role) = removed.role().and_then(|r| graph.roles.get_mut(&r)) {
            role.remove_member_ref(&id);
        }
        tracing::debug!(principal = %id, "principal deleted");
        if persist {
            if let Err(err) = self.sink.delete_principal(id) {
                tracing::warn!(principal = %id, error = %err, "failed to delete persisted principal");
            }
        }
        Ok(removed.to_record())
    }

    pub fn principal(&self, id: PrincipalId) -> Option<PrincipalRecord> {
        self.graph.read().principals.get(&id).map(Principal::to_record)
    }

    pub fn principal_count(&self) -> usize {
        self.graph.read().principals.len()
    }

    /// Moves `principal` to `role` (or to no role), updating the principal's
    /// reference and both roles' member sets atomically.
    pub fn set_role(&self, principal: PrincipalId, role: Option<RoleId>, persist: bool) -> PermissionResult<()> {
        let mut graph = self.graph.write();
        graph.relink(principal, role)?;
        tracing::debug!(%principal, role = ?role, "principal role set");
        if persist {
            self.persist_principal(&graph, principal);
        }
        Ok(())
    }

    pub fn set_principal_assertion(
        &self,
        id: PrincipalId,
        path: &str,
        granted: bool,
        persist: bool,
    ) -> PermissionResult<Assertion> {
        assertion::validate(path)?;
        let mut graph = self.graph.write();
        let stored = graph.principal_mut(id)?.assertions_mut().set(path, granted)?.clone();
        tracing::debug!(principal = %id, assertion = %stored, "principal assertion set");
        if persist {
            self.persist_principal(&graph, id);
        }
        Ok(stored)
    }

    pub fn unset_principal_assertion(&self, id: PrincipalId, path: &str, persist: bool) -> PermissionResult<Option<Assertion>> {
        assertion::validate(path)?;
        let mut graph = self.graph.write();
        let removed = graph.principal_mut(id)?.assertions_mut().unset(path)?;
        tracing::debug!(principal = %id, path = %assertion::normalize(path), removed = removed.is_some(), "principal assertion unset");
        if persist {
            self.persist_principal(&graph, id);
        }
        Ok(removed)
    }

    // --- default role -------------------------------------------------------

    /// Sets an assertion on the default role. Never persisted.
    pub fn add_default_permission(&self, path: &str, granted: bool) -> PermissionResult<Assertion> {
        let mut graph = self.graph.write();
        Ok(graph.default_role.assertions_mut().set(path, granted)?.clone())
    }

    pub fn has_default_permission(&self, path: &str) -> PermissionResult<bool> {
        assertion::validate(path)?;
        Ok(self.graph.read().default_role.is_authorized(None, path))
    }

    // --- queries ------------------------------------------------------------

    /// Point query for a role: own set over the parent's own set.
    pub fn role_is_authorized(&self, id: RoleId, path: &str) -> PermissionResult<bool> {
        assertion::validate(path)?;
        let graph = self.graph.read();
        let role = graph.role_ref(id)?;
        let parent = role.parent().and_then(|p| graph.role(&p));
        Ok(role.is_authorized(parent, path))
    }

    /// Point query for a principal: own set over the role's own set.
    pub fn principal_is_authorized(&self, id: PrincipalId, path: &str) -> PermissionResult<bool> {
        assertion::validate(path)?;
        let graph = self.graph.read();
        let principal = graph.principal_ref(id)?;
        let role = principal.role().and_then(|r| graph.role(&r));
        Ok(principal.is_authorized(role, path))
    }

    /// Wildcard query for a role over its full ancestor chain.
    pub fn role_descendants_granted(&self, id: RoleId, root: &str) -> PermissionResult<bool> {
        assertion::validate(root)?;
        let graph = self.graph.read();
        Ok(graph.role_ref(id)?.descendants_granted(&*graph, root, self.config.max_parent_depth))
    }

    /// Wildcard query for a principal over its role's full ancestor chain.
    pub fn principal_descendants_granted(&self, id: PrincipalId, root: &str) -> PermissionResult<bool> {
        assertion::validate(root)?;
        let graph = self.graph.read();
        Ok(graph.principal_ref(id)?.descendants_granted(&*graph, root, self.config.max_parent_depth))
    }

    /// Entry point for callers holding a raw query string.
    ///
    /// A query ending in the wildcard suffix (`.*` by default) asks whether
    /// anything beneath its root is granted; any other query is a point
    /// query. Principals with no record are answered by the default role.
    pub fn has_permission(&self, principal: PrincipalId, query: &str) -> PermissionResult<bool> {
        let (root, wildcard) = self.config.split_query(query);
        assertion::validate(root)?;
        let graph = self.graph.read();
        let depth = self.config.max_parent_depth;
        let granted = match graph.principals.get(&principal) {
            Some(p) if wildcard => p.descendants_granted(&*graph, root, depth),
            Some(p) => p.is_authorized(p.role().and_then(|r| graph.role(&r)), root),
            None if wildcard => graph.default_role.descendants_granted(&*graph, root, depth),
            None => graph.default_role.is_authorized(None, root),
        };
        tracing::trace!(%principal, query, wildcard, granted, "permission query");
        Ok(granted)
    }
}
