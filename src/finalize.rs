//! Two-pass tree finalization computing `min_rights`/`max_rights` for O(1)
//! subtree pruning during lookup.
//!
//! Must run, in order, after *every* structural change to the arena;
//! partial/incremental updates are not supported — a filtered tree is
//! finalized once at construction and then only ever read.

use crate::node::{Node, NodeId};
use crate::rights::LimitedRights;

/// Upward, post-order pass: each node's bounds start at its own effective
/// access (local if set, else inherited from the parent's effective
/// access — which for a fresh build is always already resolved, since we
/// recurse root-first), then its parent folds the child's bounds in with
/// `(max |=, min &=)`.
pub(crate) fn finalize_up(arena: &mut [Node], node: NodeId, parent: NodeId) {
    let effective = if arena[node.idx()].rights.access.is_set() {
        arena[node.idx()].rights.access
    } else {
        arena[parent.idx()].rights.access
    };
    arena[node.idx()].rights.access = effective;
    arena[node.idx()].rights.min_rights = effective.rights;
    arena[node.idx()].rights.max_rights = effective.rights;

    for child in arena[node.idx()].child_ids() {
        finalize_up(arena, child, node);
    }

    let child_bounds = LimitedRights {
        access: arena[node.idx()].rights.access,
        min_rights: arena[node.idx()].rights.min_rights,
        max_rights: arena[node.idx()].rights.max_rights,
    };
    if node.0 != parent.0 {
        arena[parent.idx()].rights.max_rights |= child_bounds.max_rights;
        arena[parent.idx()].rights.min_rights &= child_bounds.min_rights;
    } else {
        // Root calls itself as its own parent; OR/AND of a set with itself
        // is idempotent, so this is a deliberate no-op.
    }
}

/// Downward, pre-order pass accumulating `var_rights`, the rights
/// contributed by any `**` ancestor that apply implicitly to every deeper
/// level.
pub(crate) fn finalize_down(arena: &mut [Node], node: NodeId, mut var_rights: LimitedRights) {
    arena[node.idx()].rights.max_rights |= var_rights.max_rights;
    arena[node.idx()].rights.min_rights &= var_rights.min_rights;

    if let Some(any_var) = arena[node.idx()]
        .pattern_children
        .as_ref()
        .and_then(|pc| pc.any_var)
    {
        let child_bounds = arena[any_var.idx()].rights;
        var_rights.combine_access(child_bounds.access);
        var_rights.combine_limits(child_bounds);
    }

    for child in arena[node.idx()].child_ids() {
        finalize_down(arena, child, var_rights);
    }
}

/// Runs both passes over the whole arena, rooted at `root`.
pub(crate) fn finalize(arena: &mut [Node], root: NodeId) {
    finalize_up(arena, root, root);
    finalize_down(arena, root, LimitedRights::identity());
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::acl::{AclRule, AnyoneEvaluator, UserEvaluator};
    use crate::builder::build_arena;
    use crate::rights::Rights;

    fn build(rules: Vec<AclRule>, user: Option<&str>, repo: &str) -> Vec<Node> {
        let mut arena = build_arena(&rules, user, repo).unwrap();
        finalize(&mut arena, NodeId(0));
        arena
    }

    #[test]
    fn bounds_respect_invariant() {
        let rules = vec![
            AclRule::from_path(1, "/", AnyoneEvaluator(Rights::READ)),
            AclRule::from_path(
                2,
                "/secret",
                UserEvaluator {
                    user: "alice".into(),
                    repository: None,
                    rights: Rights::NONE,
                },
            ),
        ];
        let arena = build(rules, Some("alice"), "r");
        for node in &arena {
            assert!(node.rights.min_rights.contains(Rights::NONE));
            assert!(node.rights.max_rights.contains(node.rights.min_rights));
            if node.rights.access.is_set() {
                assert!(node.rights.max_rights.contains(node.rights.access.rights));
            }
        }
    }

    #[test]
    fn any_var_propagates_downward() {
        let rules = vec![AclRule::from_path(
            1,
            "/a/**/z",
            UserEvaluator {
                user: "alice".into(),
                repository: None,
                rights: Rights::WRITE,
            },
        )];
        let arena = build(rules, Some("alice"), "r");
        // every node below "a" must have WRITE in its max_rights, because
        // the `**` rule could still apply further down.
        let a = arena[0].literal_children["a"];
        assert!(arena[a.idx()].rights.max_rights.contains(Rights::WRITE));
    }
}
