//! Path-based access-control engine: the filtered rule tree and lookup
//! algorithm that decide whether a given user may read and/or write a given
//! repository path.
//!
//! This crate owns everything *downstream* of a normalized ACL list: tree
//! construction, two-pass finalization, the segment-walking lookup engine,
//! and a small per-(user,repository) cache. It deliberately does not parse
//! authz-file text, expand groups, or fetch configuration — those are named
//! external interfaces ([`acl::RightsEvaluator`], [`acl::AclRule`]) this
//! crate merely consumes.
//!
//! See `DESIGN.md` for what each module is grounded on.

pub mod acl;
mod builder;
mod cache;
mod error;
mod finalize;
mod lookup;
mod node;
mod rights;
mod tree;

pub use acl::{AclRule, AnyoneEvaluator, RightsEvaluator, UserEvaluator};
pub use error::AuthzError;
pub use rights::{Access, LimitedRights, RequiredAccess, Rights};
pub use tree::FilteredTree;

use cache::TreeCache;

/// Sentinel substituted for a `None` repository name.
pub const ANY_REPOSITORY: &str = "[ANY_REPOSITORY]";

/// Top-level facade: an authz handle over one parsed ACL list, with its own
/// per-(user,repository) cache of filtered trees.
///
/// Not `Sync`: the cache is mutated (MRU reshuffle, possibly tree
/// construction/eviction) on every query, so concurrent queries against the
/// same handle must be externally serialized by the caller — this type does
/// not wrap itself in a lock, the way `pbs_config::acl::cached_config`'s
/// process-global cache does, because a single handle is meant to be owned
/// by one thread/request path at a time. Distinct handles are fully
/// independent and may be used in parallel.
pub struct Authz {
    rules: Vec<AclRule>,
    cache: TreeCache,
}

impl Authz {
    /// Builds a handle over an already-parsed, already-group-expanded ACL
    /// list (the out-of-scope parser's output), with the default cache
    /// capacity.
    pub fn new(rules: Vec<AclRule>) -> Self {
        Self::with_cache_capacity(rules, cache::DEFAULT_CAPACITY)
    }

    pub fn with_cache_capacity(rules: Vec<AclRule>, capacity: usize) -> Self {
        Authz {
            rules,
            cache: TreeCache::new(capacity),
        }
    }

    /// Number of filtered trees currently cached.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached filtered tree, forcing the next query for any
    /// `(user, repository)` pair to rebuild from scratch. Useful after the
    /// underlying ACL configuration changes; this crate has no notion of
    /// file mtimes or config generations itself (that lives in the
    /// out-of-scope retrieval layer), so the caller decides when to call
    /// this.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Answers whether `user` has `required` access to `path` in `repo`.
    ///
    /// - `repo = None` substitutes the sentinel [`ANY_REPOSITORY`].
    /// - `path = None` answers "does this principal have any access at all,
    ///   anywhere in the repository" using the tree's precomputed root
    ///   bounds.
    /// - Otherwise `path` must start with `/`; empty segments and repeated
    ///   `/` are tolerated.
    pub fn check_access(
        &mut self,
        repo: Option<&str>,
        path: Option<&str>,
        user: Option<&str>,
        required: RequiredAccess,
    ) -> Result<bool, AuthzError> {
        let repo = repo.unwrap_or(ANY_REPOSITORY);
        let (required_rights, recursive) = required.split();

        let tree = self.cache.get_or_build(&self.rules, user, repo)?;

        let Some(path) = path else {
            return Ok(tree.max_rights_anywhere().contains(required_rights));
        };

        if !path.starts_with('/') {
            return Err(AuthzError::MalformedPath {
                path: path.to_string(),
            });
        }

        Ok(tree.lookup(path, required_rights, recursive))
    }

    /// Convenience wrapper around [`check_access`](Self::check_access)
    /// exposing the root's precomputed upper bound directly, for callers
    /// (directory listings, UI tree views) that just want "is there any
    /// point in even trying".
    pub fn max_rights_anywhere(
        &mut self,
        repo: Option<&str>,
        user: Option<&str>,
    ) -> Result<Rights, AuthzError> {
        let repo = repo.unwrap_or(ANY_REPOSITORY);
        let tree = self.cache.get_or_build(&self.rules, user, repo)?;
        Ok(tree.max_rights_anywhere())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use acl::{AnyoneEvaluator, UserEvaluator};

    fn rights(required: &[&str]) -> RequiredAccess {
        required.iter().fold(RequiredAccess::NONE, |acc, r| {
            acc | match *r {
                "read" => RequiredAccess::READ,
                "write" => RequiredAccess::WRITE,
                "recursive" => RequiredAccess::RECURSIVE,
                other => panic!("unknown right {other}"),
            }
        })
    }

    #[test]
    fn scenario_1_basic_user_rule() {
        let rules = vec![
            AclRule::from_path(1, "/", AnyoneEvaluator(Rights::NONE)),
            AclRule::from_path(
                2,
                "/trunk",
                UserEvaluator {
                    user: "alice".into(),
                    repository: None,
                    rights: Rights::READ,
                },
            ),
        ];
        let mut authz = Authz::new(rules);

        assert!(authz
            .check_access(Some("r"), Some("/trunk/src"), Some("alice"), rights(&["read"]))
            .unwrap());
        assert!(!authz
            .check_access(Some("r"), Some("/trunk/src"), Some("bob"), rights(&["read"]))
            .unwrap());
        assert!(!authz
            .check_access(Some("r"), Some("/branches"), Some("alice"), rights(&["read"]))
            .unwrap());
    }

    #[test]
    fn scenario_2_recursive_denial() {
        let rules = vec![
            AclRule::from_path(1, "/", AnyoneEvaluator(Rights::READ)),
            AclRule::from_path(
                2,
                "/secret",
                AnyoneEvaluator(Rights::NONE),
            ),
        ];
        let mut authz = Authz::new(rules);

        assert!(!authz
            .check_access(Some("r"), Some("/secret/x"), Some("alice"), rights(&["read"]))
            .unwrap());
        assert!(authz
            .check_access(Some("r"), Some("/other"), Some("alice"), rights(&["read"]))
            .unwrap());
        assert!(!authz
            .check_access(
                Some("r"),
                Some("/"),
                Some("alice"),
                rights(&["read", "recursive"])
            )
            .unwrap());
        assert!(authz
            .check_access(
                Some("r"),
                Some("/other"),
                Some("alice"),
                rights(&["read", "recursive"])
            )
            .unwrap());
    }

    #[test]
    fn scenario_3_any_wildcard() {
        let rules = vec![
            AclRule::from_path(1, "/", AnyoneEvaluator(Rights::READ)),
            AclRule::from_path(
                2,
                "/*/private",
                UserEvaluator {
                    user: "alice".into(),
                    repository: None,
                    rights: Rights::NONE,
                },
            ),
        ];
        let mut authz = Authz::new(rules);

        assert!(!authz
            .check_access(Some("r"), Some("/a/private"), Some("alice"), rights(&["read"]))
            .unwrap());
        assert!(authz
            .check_access(Some("r"), Some("/a/public"), Some("alice"), rights(&["read"]))
            .unwrap());
    }

    #[test]
    fn scenario_4_recursive_wildcard() {
        let rules = vec![AclRule::from_path(
            1,
            "/a/**/z",
            UserEvaluator {
                user: "alice".into(),
                repository: None,
                rights: Rights::WRITE,
            },
        )];
        let mut authz = Authz::new(rules);

        assert!(authz
            .check_access(Some("r"), Some("/a/z"), Some("alice"), rights(&["write"]))
            .unwrap());
        assert!(authz
            .check_access(Some("r"), Some("/a/x/y/z"), Some("alice"), rights(&["write"]))
            .unwrap());
        assert!(!authz
            .check_access(Some("r"), Some("/a/x/y"), Some("alice"), rights(&["write"]))
            .unwrap());
    }

    #[test]
    fn scenario_5_suffix_pattern() {
        let rules = vec![
            AclRule::from_path(1, "/", AnyoneEvaluator(Rights::NONE)),
            AclRule::from_path(2, "/docs/*.md", AnyoneEvaluator(Rights::READ)),
        ];
        let mut authz = Authz::new(rules);

        assert!(authz
            .check_access(Some("r"), Some("/docs/readme.md"), Some("alice"), rights(&["read"]))
            .unwrap());
        assert!(!authz
            .check_access(Some("r"), Some("/docs/readme.txt"), Some("alice"), rights(&["read"]))
            .unwrap());
    }

    #[test]
    fn scenario_6_precedence() {
        let rules = vec![
            AclRule::from_path(
                7,
                "/p",
                UserEvaluator {
                    user: "alice".into(),
                    repository: None,
                    rights: Rights::READ,
                },
            ),
            AclRule::from_path(
                9,
                "/p",
                UserEvaluator {
                    user: "alice".into(),
                    repository: None,
                    rights: Rights::READ_WRITE,
                },
            ),
        ];
        let mut authz = Authz::new(rules);

        assert!(authz
            .check_access(Some("r"), Some("/p"), Some("alice"), rights(&["write"]))
            .unwrap());
    }

    #[test]
    fn scenario_7_null_path() {
        let rules = vec![AclRule::from_path(
            1,
            "/x",
            UserEvaluator {
                user: "alice".into(),
                repository: None,
                rights: Rights::WRITE,
            },
        )];
        let mut authz = Authz::new(rules);

        assert!(authz
            .check_access(Some("r"), None, Some("alice"), rights(&["write"]))
            .unwrap());
        assert!(!authz
            .check_access(Some("r"), None, Some("bob"), rights(&["write"]))
            .unwrap());
    }

    #[test]
    fn malformed_path_is_an_error() {
        let mut authz = Authz::new(vec![AclRule::from_path(
            1,
            "/",
            AnyoneEvaluator(Rights::READ),
        )]);
        let err = authz
            .check_access(Some("r"), Some("no-leading-slash"), Some("alice"), rights(&["read"]))
            .unwrap_err();
        assert!(matches!(err, AuthzError::MalformedPath { .. }));
    }

    #[test]
    fn leaf_collision_is_rejected() {
        let rules = vec![
            AclRule::from_path(1, "/p", AnyoneEvaluator(Rights::READ)),
            AclRule::from_path(2, "/p", AnyoneEvaluator(Rights::WRITE)),
        ];
        let mut authz = Authz::new(rules);
        let err = authz
            .check_access(Some("r"), Some("/p"), Some("alice"), rights(&["read"]))
            .unwrap_err();
        assert!(matches!(err, AuthzError::ConfigurationInvariantViolated { .. }));
    }

    #[test]
    fn cache_is_transparent_across_repeated_queries() {
        let rules = vec![
            AclRule::from_path(1, "/", AnyoneEvaluator(Rights::READ)),
            AclRule::from_path(
                2,
                "/trunk",
                UserEvaluator {
                    user: "alice".into(),
                    repository: None,
                    rights: Rights::READ_WRITE,
                },
            ),
        ];
        let mut authz = Authz::new(rules);

        let paths = ["/trunk/a", "/other", "/trunk/b", "/trunk/a/b/c"];
        let mut first_pass = Vec::new();
        for p in paths {
            first_pass.push(
                authz
                    .check_access(Some("r"), Some(p), Some("alice"), rights(&["write"]))
                    .unwrap(),
            );
        }
        authz.clear_cache();
        let mut second_pass = Vec::new();
        for p in paths {
            second_pass.push(
                authz
                    .check_access(Some("r"), Some(p), Some("alice"), rights(&["write"]))
                    .unwrap(),
            );
        }
        assert_eq!(first_pass, second_pass);
    }
}
