//! The filtered rule tree: one arena specialized to a single
//! `(user, repository)` pair.

use crate::acl::AclRule;
use crate::error::AuthzError;
use crate::node::{Node, NodeId};
use crate::rights::Rights;

/// A rule tree built from a parsed ACL list, filtered to one
/// `(user, repository)` pair.
///
/// Lifetime: created lazily by the cache on a miss, destroyed wholesale
/// (one `Vec` drop) when evicted.
pub struct FilteredTree {
    pub(crate) user: Option<String>,
    pub(crate) repository: String,
    pub(crate) arena: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) lookup_state: crate::lookup::LookupState,
}

impl FilteredTree {
    pub fn build(
        rules: &[AclRule],
        user: Option<&str>,
        repository: &str,
    ) -> Result<FilteredTree, AuthzError> {
        let mut arena = crate::builder::build_arena(rules, user, repository)?;
        let root = NodeId(0);
        crate::finalize::finalize(&mut arena, root);
        log::debug!(
            "built filtered acl tree for user={:?} repository={} ({} nodes)",
            user,
            repository,
            arena.len()
        );
        Ok(FilteredTree {
            user: user.map(str::to_string),
            repository: repository.to_string(),
            arena,
            root,
            lookup_state: crate::lookup::LookupState::new(),
        })
    }

    pub(crate) fn matches(&self, user: Option<&str>, repository: &str) -> bool {
        self.repository == repository && self.user.as_deref() == user
    }

    /// `root.rights.max_rights`, stripped of anything other than read/write
    /// — "does this principal have any access at all, anywhere".
    pub fn max_rights_anywhere(&self) -> Rights {
        self.arena[self.root.idx()].rights.max_rights
    }

    pub(crate) fn lookup(&mut self, path: &str, required: Rights, recursive: bool) -> bool {
        crate::lookup::lookup(
            &self.arena,
            self.root,
            &mut self.lookup_state,
            path,
            required,
            recursive,
        )
    }
}
