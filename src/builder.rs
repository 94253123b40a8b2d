//! Tree builder: folds a sequence of ACLs into one tree.
//!
//! Grounded in `pbs-config::acl::AclTree::get_or_insert_node`'s walk, split
//! out into per-segment-kind dispatch and generalized with a
//! `ConstructionContext` prefix-reuse optimization: consecutive rules that
//! share a path prefix (as they do after sorting by path, the common case)
//! resume insertion partway down the trail instead of re-walking from the
//! root. That optimization is a pure constant-factor speedup: disabling it
//! (by passing an empty context on every insert) would not change tree
//! semantics at all.

use crate::acl::AclRule;
use crate::error::AuthzError;
use crate::node::{Node, NodeId};
use crate::rights::Access;
use crate::segment::{Segment, SegmentKind};

/// Arena-backed tree under construction.
pub(crate) struct Arena {
    pub nodes: Vec<Node>,
}

impl Arena {
    fn new() -> Self {
        Arena {
            nodes: vec![Node::root()],
        }
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn alloc(&mut self, segment: Segment) -> NodeId {
        self.nodes.push(Node::new(segment));
        NodeId((self.nodes.len() - 1) as u32)
    }

    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.idx()]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.idx()]
    }
}

/// `(segment, node)` pairs traversed for the previous ACL, so the next
/// insertion can resume at the deepest node whose path prefix still matches.
#[derive(Default)]
struct ConstructionContext {
    trail: Vec<(Segment, NodeId)>,
}

impl ConstructionContext {
    /// Returns the index into `rule` at which insertion should resume, and
    /// the node to resume from.
    fn resume_point(&self, rule: &[Segment]) -> (usize, NodeId) {
        let mut depth = 0;
        for (i, seg) in rule.iter().enumerate() {
            match self.trail.get(i) {
                Some((prev_seg, _)) if prev_seg == seg => depth = i + 1,
                _ => break,
            }
        }
        let node = if depth == 0 {
            NodeId(0)
        } else {
            self.trail[depth - 1].1
        };
        (depth, node)
    }
}

/// Inserts one already-classified segment below `at`, creating the child if
/// necessary, and returns the child's id.
fn insert_segment(arena: &mut Arena, at: NodeId, segment: &Segment) -> NodeId {
    match segment.kind {
        SegmentKind::Literal => {
            if let Some(existing) = arena.get(at).literal_children.get(&segment.pattern) {
                return *existing;
            }
            let child = arena.alloc(segment.clone());
            arena.get_mut(at).literal_children.insert(segment.pattern.clone(), child);
            child
        }
        SegmentKind::Any => {
            if let Some(existing) = arena.get(at).pattern_children.as_ref().and_then(|pc| pc.any) {
                return existing;
            }
            let child = arena.alloc(segment.clone());
            arena.get_mut(at).pattern_children_mut().any = Some(child);
            child
        }
        SegmentKind::AnyRecursive => {
            if let Some(existing) = arena.get(at).pattern_children.as_ref().and_then(|pc| pc.any_var) {
                return existing;
            }
            let child = arena.alloc(segment.clone());
            arena.get_mut(child).pattern_children_mut().repeat = true;
            arena.get_mut(at).pattern_children_mut().any_var = Some(child);
            child
        }
        SegmentKind::Prefix => {
            let existing = arena
                .get(at)
                .pattern_children
                .as_ref()
                .and_then(|pc| pc.prefixes.iter().find(|(p, _)| *p == segment.pattern).map(|(_, id)| *id));
            if let Some(existing) = existing {
                return existing;
            }
            let child = arena.alloc(segment.clone());
            let pc = arena.get_mut(at).pattern_children_mut();
            let pos = pc.prefixes.partition_point(|(p, _)| p.as_str() < segment.pattern.as_str());
            pc.prefixes.insert(pos, (segment.pattern.clone(), child));
            child
        }
        SegmentKind::Suffix => {
            let mut reversed = String::new();
            crate::segment::reverse_in_place(&mut reversed, &segment.pattern);
            let existing = arena
                .get(at)
                .pattern_children
                .as_ref()
                .and_then(|pc| pc.suffixes.iter().find(|(p, _)| *p == segment.pattern).map(|(_, id)| *id));
            if let Some(existing) = existing {
                return existing;
            }
            let child = arena.alloc(segment.clone());
            let pc = arena.get_mut(at).pattern_children_mut();
            let pos = pc.suffixes.partition_point(|(p, _)| {
                let mut rp = String::new();
                crate::segment::reverse_in_place(&mut rp, p);
                rp.as_str() < reversed.as_str()
            });
            pc.suffixes.insert(pos, (segment.pattern.clone(), child));
            child
        }
        SegmentKind::Fnmatch => {
            let existing = arena
                .get(at)
                .pattern_children
                .as_ref()
                .and_then(|pc| pc.complex.iter().find(|(p, _)| *p == segment.pattern).map(|(_, id)| *id));
            if let Some(existing) = existing {
                return existing;
            }
            let child = arena.alloc(segment.clone());
            arena.get_mut(at).pattern_children_mut().complex.push((segment.pattern.clone(), child));
            child
        }
    }
}

/// Folds `rules` (already filtered to the rules relevant to `user`/`repo` by
/// the caller's evaluator) into one arena, rooted at index 0.
///
/// Returns the raw arena; the caller (`FilteredTree::build`) still owes it
/// the two finalization passes before it is fit to query.
pub(crate) fn build_arena(
    rules: &[AclRule],
    user: Option<&str>,
    repository: &str,
) -> Result<Vec<Node>, AuthzError> {
    let mut arena = Arena::new();
    let mut ctx = ConstructionContext::default();

    for acl in rules {
        let Some(rights) = acl.evaluator.evaluate(user, repository) else {
            continue;
        };

        let (depth, mut node) = ctx.resume_point(&acl.rule);
        ctx.trail.truncate(depth);
        for seg in &acl.rule[depth..] {
            node = insert_segment(&mut arena, node, seg);
            ctx.trail.push((seg.clone(), node));
        }

        if acl.rule.is_empty() {
            node = arena.root();
        }

        let access = Access {
            sequence_number: acl.sequence_number,
            rights,
        };

        let target = arena.get_mut(node);
        if target.rights.access.is_set() && target.rights.access.sequence_number != 0 {
            return Err(AuthzError::ConfigurationInvariantViolated {
                path: acl
                    .rule
                    .iter()
                    .map(|s| s.pattern.as_str())
                    .collect::<Vec<_>>()
                    .join("/"),
            });
        }
        target.rights.access = access;
    }

    Ok(arena.nodes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::acl::AnyoneEvaluator;
    use crate::rights::Rights;

    /// Two consecutive rules that share no path prefix at all must not land
    /// the second rule's segments under the first rule's nodes: the
    /// `ConstructionContext` prefix-reuse optimization must fall all the way
    /// back to the root when the very first segment already diverges, even
    /// though the previous trail was non-empty.
    #[test]
    fn unrelated_consecutive_rules_both_root_at_the_tree_root() {
        let rules = vec![
            AclRule::from_path(1, "/a/b", AnyoneEvaluator(Rights::READ)),
            AclRule::from_path(2, "/c/d", AnyoneEvaluator(Rights::WRITE)),
        ];
        let arena = build_arena(&rules, None, "r").unwrap();

        let root = &arena[0];
        assert!(root.literal_children.contains_key("a"));
        assert!(
            root.literal_children.contains_key("c"),
            "second rule's first segment must be inserted under the root, not under 'a'"
        );

        let a_id = *root.literal_children.get("a").unwrap();
        let a_node = &arena[a_id.idx()];
        assert!(
            !a_node.literal_children.contains_key("c"),
            "'c' must not have been inserted as a descendant of 'a'"
        );
    }
}
