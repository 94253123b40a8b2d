//! Lookup engine: advances a *set* of currently-matching tree nodes one path
//! segment at a time.

use smallvec::SmallVec;

use crate::node::{Node, NodeId};
use crate::rights::{Access, LimitedRights, Rights};

/// Splits a repository-relative path into its non-empty segments.
///
/// Trailing and leading `/` are stripped; runs of `/` internally collapse to
/// a single separator (an empty final segment after a trailing `/` is never
/// produced). `"/"` normalizes to zero segments (root).
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Reusable state for successive lookups against the same [`FilteredTree`](crate::tree::FilteredTree).
///
/// Reuses parent-path walks across successive sibling queries: if the
/// previous query's path is a proper directory prefix of this one, the walk
/// resumes from `current`/`rights` instead of restarting at the root.
pub struct LookupState {
    pub(crate) rights: LimitedRights,
    pub(crate) current: Vec<NodeId>,
    pub(crate) next: Vec<NodeId>,
    pub(crate) parent_path: String,
    pub(crate) parent_rights: LimitedRights,
    pub(crate) scratch: String,
}

impl LookupState {
    pub(crate) fn new() -> Self {
        LookupState {
            rights: LimitedRights::identity(),
            current: Vec::new(),
            next: Vec::new(),
            parent_path: String::new(),
            parent_rights: LimitedRights::identity(),
            scratch: String::new(),
        }
    }
}

/// Appends `node` (by id) to `state.next`, folding its access/limits into
/// `state.rights`, and — because `**` matches zero segments — recurses the
/// same treatment onto its `any_var` child if it has one.
fn add_next_node(arena: &[Node], state: &mut LookupState, node: NodeId) {
    let n = &arena[node.idx()];
    state.rights.combine_access(n.rights.access);
    state.rights.combine_limits(n.rights);
    state.next.push(node);

    if let Some(any_var) = n.pattern_children.as_ref().and_then(|pc| pc.any_var) {
        add_next_node(arena, state, any_var);
    }
}

/// Resets `state` for a fresh walk over `path` from `root`, reusing the
/// previous walk if `path` is a descendant of the last query's path.
///
/// Returns the segments still to be consumed.
fn init_lookup_state<'a>(
    arena: &[Node],
    root: NodeId,
    state: &'a mut LookupState,
    segments: &[&str],
) -> usize {
    if !state.parent_path.is_empty() {
        let joined = segments.join("/");
        let prefix_with_slash = format!("{}/", state.parent_path);
        if joined.starts_with(&prefix_with_slash) {
            // `state.current`/`state.rights` already reflect the walk up to
            // `parent_path`; resume from there instead of restarting at the
            // root.
            state.rights = state.parent_rights;
            let consumed = split_path(&state.parent_path).len();
            return consumed;
        }
    }

    state.current.clear();
    state.current.push(root);
    state.rights = arena[root.idx()].rights;
    state.parent_rights = arena[root.idx()].rights;
    state.parent_path.clear();
    state.scratch.clear();

    if let Some(any_var) = arena[root.idx()]
        .pattern_children
        .as_ref()
        .and_then(|pc| pc.any_var)
    {
        let child = &arena[any_var.idx()];
        state.rights.combine_access(child.rights.access);
        state.rights.combine_limits(child.rights);
        state.current.push(any_var);
    }

    0
}

/// Finds every entry in `prefixes` (kept sorted by segment text at
/// construction time) whose segment is a byte-wise prefix of `seg`.
///
/// Every matching entry sorts at or before `seg` itself, so we narrow with a
/// partition point first and only byte-compare the remaining candidates —
/// a range-then-scan shape that doesn't assume the matches are perfectly
/// contiguous (a handful of false candidates in a small array costs nothing
/// and keeps this correct regardless of how the prefixes happen to
/// interleave lexicographically).
fn matching_prefixes(prefixes: &[(String, NodeId)], seg: &str) -> SmallVec<[NodeId; 4]> {
    let mut out = SmallVec::new();
    let end = prefixes.partition_point(|(p, _)| p.as_str() <= seg);
    for (p, id) in &prefixes[..end] {
        if crate::segment::match_prefix(p, seg) {
            out.push(*id);
        }
    }
    out
}

/// Same idea as [`matching_prefixes`] but over segments sorted (by the
/// builder, see `builder.rs`) by *reversed* text, matching against the
/// reversed query segment so a `*suffix` pattern's matching becomes a
/// prefix check on the reversal: narrow with a partition point on the
/// reversed keys first, then byte-compare only the remaining candidates.
fn matching_suffixes(suffixes: &[(String, NodeId)], reversed_seg: &str) -> SmallVec<[NodeId; 4]> {
    let mut out = SmallVec::new();
    let mut rev_buf = String::new();
    let end = suffixes.partition_point(|(p, _)| {
        crate::segment::reverse_in_place(&mut rev_buf, p);
        rev_buf.as_str() <= reversed_seg
    });
    for (p, id) in &suffixes[..end] {
        crate::segment::reverse_in_place(&mut rev_buf, p);
        if crate::segment::match_prefix(&rev_buf, reversed_seg) {
            out.push(*id);
        }
    }
    out
}

/// `lookup(state, path, required, recursive)`: the main engine entry point.
/// `required` must not contain the recursive bit (callers split it via
/// [`crate::rights::RequiredAccess::split`] before calling this).
pub(crate) fn lookup(
    arena: &[Node],
    root: NodeId,
    state: &mut LookupState,
    path: &str,
    required: Rights,
    recursive: bool,
) -> bool {
    let segments = split_path(path);
    let skip = init_lookup_state(arena, root, state, &segments);
    let mut remaining = &segments[skip.min(segments.len())..];

    while !state.current.is_empty() && !remaining.is_empty() {
        if !state.rights.max_rights.contains(required) {
            return false;
        }
        if state.rights.min_rights.contains(required) {
            return true;
        }

        let seg = remaining[0];
        state.scratch.clear();
        state.scratch.push_str(seg);
        remaining = &remaining[1..];

        state.next.clear();
        state.rights.access = Access::UNSET;
        state.rights.min_rights = Rights::READ_WRITE;
        state.rights.max_rights = Rights::NONE;

        if !remaining.is_empty() {
            if !state.parent_path.is_empty() {
                state.parent_path.push('/');
            }
            state.parent_path.push_str(seg);
        }

        let current_nodes: SmallVec<[NodeId; 4]> = state.current.iter().copied().collect();
        for &n in &current_nodes {
            let node = &arena[n.idx()];

            if let Some(&lit) = node.literal_children.get(seg) {
                add_next_node(arena, state, lit);
            }

            if let Some(pc) = &node.pattern_children {
                if let Some(any) = pc.any {
                    add_next_node(arena, state, any);
                }
                if pc.repeat {
                    add_next_node(arena, state, n);
                }
                for id in matching_prefixes(&pc.prefixes, seg) {
                    add_next_node(arena, state, id);
                }
                for id in matching_complex(&pc.complex, seg) {
                    add_next_node(arena, state, id);
                }
                // Suffix matching mutates `seg` via the reversal buffer, so
                // it must run last.
                let mut reversed = String::new();
                crate::segment::reverse_in_place(&mut reversed, seg);
                for id in matching_suffixes(&pc.suffixes, &reversed) {
                    add_next_node(arena, state, id);
                }
            }
        }

        if state.rights.access.sequence_number == -1 {
            state.rights.access = state.parent_rights.access;
            state.rights.min_rights &= state.parent_rights.access.rights;
            state.rights.max_rights |= state.parent_rights.access.rights;
        }

        if !remaining.is_empty() {
            std::mem::swap(&mut state.current, &mut state.next);
            state.parent_rights = state.rights;
        }
        // On the last segment, `current`/`parent_path`/`parent_rights` must
        // keep describing the node set at exactly `parent_path`'s depth (one
        // level shallower than this segment) so the next query's parent-path
        // reuse check resumes from a consistent state; `next` is discarded.
    }

    if recursive {
        state.rights.min_rights.contains(required)
    } else {
        state.rights.access.rights.contains(required)
    }
}

fn matching_complex(complex: &[(String, NodeId)], seg: &str) -> SmallVec<[NodeId; 4]> {
    let mut out = SmallVec::new();
    for (pattern, id) in complex {
        if crate::segment::match_glob(pattern, seg) {
            out.push(*id);
        }
    }
    out
}
