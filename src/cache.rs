//! Per-(user,repo) MRU cache of filtered trees.
//!
//! A small `Vec`-backed MRU, front = most recently used. Deliberately not
//! `pbs_tools::lru_cache::LruCache`'s doubly-linked-list/raw-pointer design:
//! that structure optimizes O(1) eviction for potentially large caches keyed
//! by `Hash`, while this cache is bounded by a small constant capacity
//! (default 4) and keyed by a two-field equality test with `Option<&str>`
//! null-handling that doesn't map cleanly onto a hash key — linear scan plus
//! `Vec::remove`/`insert(0, _)` is the right-sized structure here.

use crate::acl::AclRule;
use crate::error::AuthzError;
use crate::tree::FilteredTree;

pub(crate) const DEFAULT_CAPACITY: usize = 4;

pub struct TreeCache {
    trees: Vec<FilteredTree>,
    capacity: usize,
}

impl TreeCache {
    pub fn new(capacity: usize) -> Self {
        TreeCache {
            trees: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn clear(&mut self) {
        self.trees.clear();
    }

    /// Returns a mutable reference to the filtered tree for
    /// `(user, repository)`, building and caching it on a miss.
    pub fn get_or_build(
        &mut self,
        rules: &[AclRule],
        user: Option<&str>,
        repository: &str,
    ) -> Result<&mut FilteredTree, AuthzError> {
        if let Some(pos) = self.trees.iter().position(|t| t.matches(user, repository)) {
            if pos != 0 {
                let tree = self.trees.remove(pos);
                self.trees.insert(0, tree);
            }
            return Ok(&mut self.trees[0]);
        }

        log::debug!(
            "acl tree cache miss for user={:?} repository={}",
            user,
            repository
        );
        let tree = FilteredTree::build(rules, user, repository)?;

        if self.trees.len() >= self.capacity {
            // Destroy the evicted (oldest/last) tree before writing the new
            // entry, never the reverse, so peak memory never holds both a
            // full cache and an about-to-be-inserted tree at once.
            let evicted = self.trees.pop();
            log::debug!(
                "acl tree cache full (capacity {}), evicting oldest entry for user={:?} repository={}",
                self.capacity,
                evicted.as_ref().and_then(|t| t.user.clone()),
                evicted.map(|t| t.repository).unwrap_or_default(),
            );
        }

        self.trees.insert(0, tree);
        Ok(&mut self.trees[0])
    }
}
