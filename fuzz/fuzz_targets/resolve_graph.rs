#![no_main]

// Harness: resolve_graph
// Focus: arbitrary role graphs, memberships and deletes never panic, never
// produce a parent cycle, and keep member back-references consistent.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sledge_perms::{PrincipalId, Registry, RoleId};
use uuid::Uuid;

#[derive(Arbitrary, Debug)]
enum Op {
    CreateRole(u8),
    DeleteRole(u8),
    SetParent(u8, Option<u8>),
    CreatePrincipal(u8),
    SetRole(u8, Option<u8>),
    RemoveMember(u8, u8),
    SetRolePath(u8, Vec<u8>, bool),
    SetPrincipalPath(u8, Vec<u8>, bool),
    Query(u8, Vec<u8>, bool),
}

fn rid(n: u8) -> RoleId {
    RoleId(Uuid::from_u128(u128::from(n % 8) + 1))
}

fn pid(n: u8) -> PrincipalId {
    PrincipalId(Uuid::from_u128(u128::from(n % 8) + 0x100))
}

fn path(segments: &[u8]) -> String {
    let mut parts: Vec<String> = segments.iter().take(4).map(|s| format!("s{}", s % 4)).collect();
    if parts.is_empty() {
        parts.push("root".to_string());
    }
    parts.join(".")
}

fuzz_target!(|ops: Vec<Op>| {
    let reg = Registry::new_with_default_sink();
    for op in ops {
        let _ = match op {
            Op::CreateRole(r) => reg.create_role(rid(r), &format!("role{}", r % 8), false).map(|_| ()),
            Op::DeleteRole(r) => reg.delete_role(rid(r), false).map(|_| ()),
            Op::SetParent(r, p) => reg.set_parent(rid(r), p.map(rid), false),
            Op::CreatePrincipal(p) => reg.create_principal(pid(p), false),
            Op::SetRole(p, r) => reg.set_role(pid(p), r.map(rid), false),
            Op::RemoveMember(r, p) => reg.remove_member(rid(r), pid(p), false).map(|_| ()),
            Op::SetRolePath(r, segs, g) => reg.set_role_assertion(rid(r), &path(&segs), g, false).map(|_| ()),
            Op::SetPrincipalPath(p, segs, g) => {
                reg.set_principal_assertion(pid(p), &path(&segs), g, false).map(|_| ())
            }
            Op::Query(p, segs, wildcard) => {
                let query = if wildcard { format!("{}.*", path(&segs)) } else { path(&segs) };
                reg.has_permission(pid(p), &query).map(|_| ())
            }
        };
    }

    let snapshot = reg.export();
    for principal in &snapshot.principals {
        if let Some(role) = principal.role {
            let members = reg.members(role).expect("principal points at a live role");
            assert!(members.contains(&principal.id));
        }
    }
    // A fresh load re-checks every parent chain for cycles.
    Registry::new_with_default_sink().load_snapshot(snapshot).expect("exported graph reloads");
});
