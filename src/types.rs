//! Shared identifier types.
//!
//! Role and principal ids are opaque values minted by whatever hosts the
//! registry (account store, document store, admin tooling). The engine only
//! compares and hashes them; it never generates one.

use std::fmt;
use uuid::Uuid;

/// Identifies a role (a named permission group).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub Uuid);

/// Identifies a principal (an individual account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub Uuid);

impl RoleId {
    pub const fn from_uuid(id: Uuid) -> Self {
        RoleId(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl PrincipalId {
    pub const fn from_uuid(id: Uuid) -> Self {
        PrincipalId(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for RoleId {
    fn from(id: Uuid) -> Self {
        RoleId(id)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(id: Uuid) -> Self {
        PrincipalId(id)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "role:{}", self.0)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "principal:{}", self.0)
    }
}
