use sledge_perms::access::AssertionSet;
use sledge_perms::{Assertion, PermissionError, PrincipalId, Registry, RoleId};
use uuid::Uuid;

fn rid(n: u128) -> RoleId {
    RoleId(Uuid::from_u128(n))
}

fn pid(n: u128) -> PrincipalId {
    PrincipalId(Uuid::from_u128(0xABCD_0000 + n))
}

/// Parent R1 with `x`=true, child R2 with `x.y`=false, principal P in R2.
fn parent_child() -> Registry {
    let reg = Registry::new_with_default_sink();
    reg.create_role(rid(1), "R1", false).unwrap();
    reg.create_role(rid(2), "R2", false).unwrap();
    reg.set_parent(rid(2), Some(rid(1)), false).unwrap();
    reg.set_role_assertion(rid(1), "x", true, false).unwrap();
    reg.set_role_assertion(rid(2), "x.y", false, false).unwrap();
    reg.create_principal(pid(1), false).unwrap();
    reg.add_member(rid(2), pid(1), false).unwrap();
    reg
}

// --- Resolution primitives ---

#[test]
fn unmatched_paths_resolve_to_denied() {
    let reg = parent_child();
    for path in ["z", "x", "x.y.z", "y.x"] {
        assert!(!reg.principal_is_authorized(pid(1), path).unwrap(), "path {}", path);
    }
    assert!(!reg.has_permission(pid(404), "anything.at.all").unwrap());
}

#[test]
fn exact_match_beats_related_match() {
    let mut set = AssertionSet::new();
    set.set("a.b", false).unwrap();
    set.set("a", true).unwrap();
    assert_eq!(set.closest("a.b"), Some(&Assertion::denied("a.b").unwrap()));
}

#[test]
fn specificity_tie_break_is_stable_across_insertion_order() {
    let mut one = AssertionSet::new();
    one.set("a", true).unwrap();
    one.set("a.b", false).unwrap();
    let mut two = AssertionSet::new();
    two.set("a.b", false).unwrap();
    two.set("a", true).unwrap();

    for query in ["a.b.c", "a.b.c.d"] {
        assert_eq!(one.closest(query).unwrap().path(), "a.b");
        assert_eq!(one.closest(query), two.closest(query));
    }
}

#[test]
fn relatedness_is_dot_segment_ancestry_not_substring() {
    let mut set = AssertionSet::new();
    set.set("a.bc", true).unwrap();
    assert!(!set.is_authorized("a.bcd"));
    assert!(set.is_authorized("a.bc.d"));

    // A broad grant subsumes a longer, more specific query.
    let mut kick = AssertionSet::new();
    kick.set("server.kick", true).unwrap();
    assert!(kick.is_authorized("server.kick.vote"));

    // A narrow grant never answers for a broader query.
    let mut vote = AssertionSet::new();
    vote.set("server.kick.vote", true).unwrap();
    assert!(!vote.is_authorized("server.kick"));
}

// --- Inheritance ---

#[test]
fn role_own_assertion_beats_parent() {
    let reg = parent_child();
    assert!(!reg.role_is_authorized(rid(2), "x.y").unwrap());
    assert!(reg.role_is_authorized(rid(2), "x.z").unwrap());
}

#[test]
fn principal_own_assertion_beats_role() {
    let reg = Registry::new_with_default_sink();
    reg.create_role(rid(1), "R", false).unwrap();
    reg.set_role_assertion(rid(1), "x", true, false).unwrap();
    reg.create_principal(pid(1), false).unwrap();
    reg.set_role(pid(1), Some(rid(1)), false).unwrap();
    reg.set_principal_assertion(pid(1), "x.y", false, false).unwrap();

    assert!(!reg.principal_is_authorized(pid(1), "x.y").unwrap());
    assert!(reg.principal_is_authorized(pid(1), "x.z").unwrap());
}

#[test]
fn point_queries_consult_one_level_only() {
    let reg = parent_child();
    // P's role R2 has nothing related to x.z; R1 is out of reach.
    assert!(!reg.principal_is_authorized(pid(1), "x.z").unwrap());
    // Wildcards do reach R1, but only for assertions strictly below the root.
    assert!(!reg.has_permission(pid(1), "x.*").unwrap());
    reg.set_role_assertion(rid(1), "x.w", true, false).unwrap();
    assert!(reg.has_permission(pid(1), "x.*").unwrap());
}

// --- Graph maintenance ---

#[test]
fn cascading_delete_reassigns_members_and_children() {
    let reg = parent_child();
    reg.create_role(rid(3), "R3", false).unwrap();
    reg.set_parent(rid(3), Some(rid(2)), false).unwrap();

    reg.delete_role(rid(2), false).unwrap();
    assert_eq!(reg.principal(pid(1)).unwrap().role, Some(rid(1)));
    assert_eq!(reg.role(rid(3)).unwrap().parent, Some(rid(1)));
}

#[test]
fn plain_member_removal_leaves_no_role() {
    let reg = parent_child();
    assert!(reg.remove_member(rid(2), pid(1), false).unwrap());
    assert_eq!(reg.principal(pid(1)).unwrap().role, None);
    assert!(reg.role(rid(2)).is_some());
}

#[test]
fn parent_links_must_stay_acyclic() {
    let reg = parent_child();
    assert!(matches!(reg.set_parent(rid(1), Some(rid(2)), false), Err(PermissionError::ParentCycle(_))));
}

// --- Parsing helper & wildcards ---

#[test]
fn parsing_helper_normalizes() {
    let a: Assertion = "Sledgehammer.Test:TRUE".parse().unwrap();
    assert_eq!(a.path(), "sledgehammer.test");
    assert!(a.is_granted());
    assert!(!Assertion::parse("a.b.c:0").unwrap().is_granted());
    assert!(Assertion::parse("a.b.c").unwrap().is_granted());
}

#[test]
fn wildcard_true_iff_any_related_grant_in_full_chain() {
    let reg = Registry::new_with_default_sink();
    reg.create_role(rid(1), "top", false).unwrap();
    reg.create_role(rid(2), "mid", false).unwrap();
    reg.create_role(rid(3), "leaf", false).unwrap();
    reg.set_parent(rid(2), Some(rid(1)), false).unwrap();
    reg.set_parent(rid(3), Some(rid(2)), false).unwrap();
    reg.set_role_assertion(rid(1), "a.x", false, false).unwrap();
    reg.set_role_assertion(rid(3), "a.y", false, false).unwrap();
    assert!(!reg.role_descendants_granted(rid(3), "a").unwrap());

    reg.set_role_assertion(rid(1), "a.z", true, false).unwrap();
    assert!(reg.role_descendants_granted(rid(3), "a").unwrap());

    reg.set_role_assertion(rid(3), "a.z", false, false).unwrap();
    assert!(!reg.role_descendants_granted(rid(3), "a").unwrap());
}

#[test]
fn wildcard_does_not_count_assertion_at_the_root() {
    let reg = Registry::new_with_default_sink();
    reg.create_role(rid(1), "R", false).unwrap();
    reg.set_role_assertion(rid(1), "server", true, false).unwrap();
    reg.set_role_assertion(rid(1), "server.kick", false, false).unwrap();
    reg.create_principal(pid(1), false).unwrap();
    reg.add_member(rid(1), pid(1), false).unwrap();

    assert!(!reg.has_permission(pid(1), "server.*").unwrap());
    assert!(reg.has_permission(pid(1), "server").unwrap());
}

#[test]
fn end_to_end_server_kick_scenario() {
    let reg = Registry::new_with_default_sink();
    reg.create_role(rid(1), "R1", false).unwrap();
    reg.set_role_assertion(rid(1), "server.kick", true, false).unwrap();
    reg.create_role(rid(2), "R2", false).unwrap();
    reg.set_parent(rid(2), Some(rid(1)), false).unwrap();
    reg.set_role_assertion(rid(2), "server.kick.vote", false, false).unwrap();
    let u = pid(7);
    reg.create_principal(u, false).unwrap();
    reg.set_role(u, Some(rid(2)), false).unwrap();

    // R2's only assertion is narrower than the query and R1 is two levels up.
    assert!(!reg.has_permission(u, "server.kick").unwrap());
}
