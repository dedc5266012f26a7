//! Assertion sets and the closest-match resolution primitive shared by
//! roles and principals.

use std::collections::{BTreeMap, HashMap};

use crate::assertion::{self, Assertion};
use crate::error::PermissionResult;

/// Assertions collected for a wildcard query, keyed by path.
///
/// Overlaying a more local level replaces entries by path alone, so a local
/// denial overrides an inherited grant for the same node.
pub type Overlay = BTreeMap<String, Assertion>;

/// At most one assertion per normalized path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssertionSet {
    entries: HashMap<String, Assertion>,
}

impl AssertionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from stored assertions. Later duplicates win.
    pub fn from_assertions<I: IntoIterator<Item = Assertion>>(assertions: I) -> Self {
        let mut set = Self::new();
        for a in assertions {
            set.insert(a);
        }
        set
    }

    /// Upserts `path`. An existing entry has its flag replaced in place.
    pub fn set(&mut self, path: &str, granted: bool) -> PermissionResult<&Assertion> {
        let fresh = Assertion::new(path, granted)?;
        let entry = self
            .entries
            .entry(fresh.path().to_string())
            .and_modify(|a| a.set_granted(granted))
            .or_insert(fresh);
        Ok(&*entry)
    }

    /// Stores `assertion`, returning whatever previously sat at its path.
    pub fn insert(&mut self, assertion: Assertion) -> Option<Assertion> {
        self.entries.insert(assertion.path().to_string(), assertion)
    }

    /// Removes the assertion at `path`, if any.
    pub fn unset(&mut self, path: &str) -> PermissionResult<Option<Assertion>> {
        let key = assertion::canonical(path)?;
        Ok(self.entries.remove(&key))
    }

    /// Exact-key lookup.
    pub fn explicit(&self, path: &str) -> Option<&Assertion> {
        self.entries.get(&assertion::normalize(path))
    }

    /// The assertion that governs `path` within this set alone.
    ///
    /// An exact match wins outright. Otherwise the most specific ancestor of
    /// `path` is returned: among covering assertions, one replaces the current
    /// candidate whenever the candidate covers it. Covering assertions of a
    /// single path form a chain, so the result does not depend on iteration
    /// order.
    pub fn closest(&self, path: &str) -> Option<&Assertion> {
        let path = assertion::normalize(path);
        if let Some(exact) = self.entries.get(&path) {
            return Some(exact);
        }
        let mut candidate: Option<&Assertion> = None;
        for a in self.entries.values() {
            if !assertion::is_ancestor(a.path(), &path) {
                continue;
            }
            match candidate {
                None => candidate = Some(a),
                Some(c) if assertion::is_ancestor(c.path(), a.path()) => candidate = Some(a),
                Some(_) => {}
            }
        }
        candidate
    }

    /// Fail-closed point query against this set alone.
    pub fn is_authorized(&self, path: &str) -> bool {
        self.closest(path).map(Assertion::is_granted).unwrap_or(false)
    }

    /// Every assertion strictly beneath `root`, ordered by path. An assertion
    /// at `root` itself is not a descendant.
    pub fn descendants_of(&self, root: &str) -> Vec<&Assertion> {
        let root = assertion::normalize(root);
        let mut found: Vec<&Assertion> =
            self.entries.values().filter(|a| assertion::is_ancestor(&root, a.path())).collect();
        found.sort_unstable_by(|x, y| x.path().cmp(y.path()));
        found
    }

    /// Writes this set's descendants of `root` over `overlay`, keyed by path.
    pub fn overlay_descendants(&self, root: &str, overlay: &mut Overlay) {
        for a in self.descendants_of(root) {
            overlay.insert(a.path().to_string(), a.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assertion> {
        self.entries.values()
    }

    /// Owned copy of every assertion, ordered by path.
    pub fn to_sorted_vec(&self) -> Vec<Assertion> {
        let mut all: Vec<Assertion> = self.entries.values().cloned().collect();
        all.sort_unstable_by(|x, y| x.path().cmp(y.path()));
        all
    }
}

/// Combines a local and an inherited point-query result.
///
/// Both inputs are either the queried path itself or one of its ancestors.
/// The more specific one governs; on identical paths the local one wins.
pub fn resolve_layers<'a>(
    local: Option<&'a Assertion>,
    inherited: Option<&'a Assertion>,
) -> Option<&'a Assertion> {
    match (local, inherited) {
        (Some(l), Some(i)) => {
            if l.path() == i.path() || assertion::is_ancestor(i.path(), l.path()) {
                Some(l)
            } else {
                Some(i)
            }
        }
        (Some(l), None) => Some(l),
        (None, inherited) => inherited,
    }
}

/// True if anything in the collected overlay is granted.
pub fn any_granted(overlay: &Overlay) -> bool {
    overlay.values().any(Assertion::is_granted)
}
