//! Rule tree node and its arena.

use std::collections::HashMap;

use crate::rights::LimitedRights;
use crate::segment::Segment;

/// Index of a [`Node`] inside a [`FilteredTree`](crate::tree::FilteredTree)'s
/// arena. Index-based children rather than `Box`/`Rc` so an evicted tree is
/// freed by dropping one `Vec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// The `*`/`**`/prefix/suffix/glob substructure attached to a node when it
/// has pattern children.
#[derive(Debug, Default)]
pub struct PatternChildren {
    /// `*` child: matches exactly one arbitrary segment.
    pub any: Option<NodeId>,
    /// `**` child: matches zero or more segments. Its node always has
    /// `repeat == true`.
    pub any_var: Option<NodeId>,
    /// `prefix*` children, kept sorted by segment text so matches form a
    /// contiguous range under binary search.
    pub prefixes: Vec<(String, NodeId)>,
    /// `*suffix` children, kept sorted by *reversed* segment text.
    pub suffixes: Vec<(String, NodeId)>,
    /// General glob children, unordered.
    pub complex: Vec<(String, NodeId)>,
    /// True exactly when this node is itself a `**` segment, so it stays
    /// active for every deeper level too (it matches zero segments, so it
    /// is always also pushed into `next` alongside whatever matched).
    pub repeat: bool,
}

/// A node in the filtered rule tree.
#[derive(Debug)]
pub struct Node {
    /// The segment (text + kind) of the edge leading to this node. The
    /// root's segment is an empty literal and is never matched against.
    pub segment: Segment,
    pub rights: LimitedRights,
    pub literal_children: HashMap<String, NodeId>,
    pub pattern_children: Option<PatternChildren>,
}

impl Node {
    pub fn new(segment: Segment) -> Self {
        Node {
            segment,
            rights: LimitedRights::identity(),
            literal_children: HashMap::new(),
            pattern_children: None,
        }
    }

    pub fn root() -> Self {
        let mut n = Node::new(Segment::literal(""));
        n.rights.access = crate::rights::Access::ROOT_DEFAULT;
        n
    }

    pub(crate) fn pattern_children_mut(&mut self) -> &mut PatternChildren {
        self.pattern_children.get_or_insert_with(PatternChildren::default)
    }

    /// All direct children, for the finalization passes that must recurse
    /// into every child regardless of kind.
    pub fn child_ids(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.literal_children.values().copied().collect();
        if let Some(pc) = &self.pattern_children {
            out.extend(pc.any);
            out.extend(pc.any_var);
            out.extend(pc.prefixes.iter().map(|(_, id)| *id));
            out.extend(pc.suffixes.iter().map(|(_, id)| *id));
            out.extend(pc.complex.iter().map(|(_, id)| *id));
        }
        out
    }
}
