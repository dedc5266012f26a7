//! Access-control objects: assertion sets, roles and principals.
//!
//! These types hold no locks and do no I/O. Cross-object consistency
//! (membership back-references, cascading deletes) is kept by the registry.

pub mod principal;
pub mod role;
pub mod set;

pub use principal::{Principal, PrincipalRecord};
pub use role::{Role, RoleLookup, RoleRecord};
pub use set::{AssertionSet, Overlay};
