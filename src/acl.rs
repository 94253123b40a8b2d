//! Interfaces consumed from the (out-of-scope) authz-file parser.
//!
//! This crate never reads an authz file, expands a group, or fetches an
//! in-repository config. It only consumes the parser's *output*: an ordered
//! list of [`AclRule`]s, each able to [`RightsEvaluator::evaluate`] itself
//! against a `(user, repository)` pair with group membership and
//! anonymous/authenticated selectors already resolved.

use crate::rights::Rights;
use crate::segment::Segment;

/// Evaluates a single ACL's granted rights for a given principal and
/// repository.
///
/// Returning `None` means "this ACL does not apply to this
/// (user, repository)" — distinct from `Some(Rights::NONE)`, which means
/// the ACL applies and grants nothing.
pub trait RightsEvaluator: std::fmt::Debug {
    fn evaluate(&self, user: Option<&str>, repository: &str) -> Option<Rights>;
}

/// A rights evaluator that always applies, unconditionally granting the
/// same rights to anyone. Useful for tests and for `[/ = read for *]`-style
/// global rules.
#[derive(Debug, Clone)]
pub struct AnyoneEvaluator(pub Rights);

impl RightsEvaluator for AnyoneEvaluator {
    fn evaluate(&self, _user: Option<&str>, _repository: &str) -> Option<Rights> {
        Some(self.0)
    }
}

/// A rights evaluator scoped to one specific user on one specific
/// repository (or any repository, via `"[ANY_REPOSITORY]"` / a `None`
/// repository filter).
#[derive(Debug, Clone)]
pub struct UserEvaluator {
    pub user: String,
    pub repository: Option<String>,
    pub rights: Rights,
}

impl RightsEvaluator for UserEvaluator {
    fn evaluate(&self, user: Option<&str>, repository: &str) -> Option<Rights> {
        if user != Some(self.user.as_str()) {
            return None;
        }
        if let Some(repo) = &self.repository {
            if repo != repository {
                return None;
            }
        }
        Some(self.rights)
    }
}

/// One path rule from the configuration: a rule path (list of segments), a
/// non-decreasing sequence number matching source-file order, and an
/// evaluator for its rights.
#[derive(Debug)]
pub struct AclRule {
    pub sequence_number: i64,
    pub rule: Vec<Segment>,
    pub evaluator: Box<dyn RightsEvaluator>,
}

impl AclRule {
    pub fn new(
        sequence_number: i64,
        rule: Vec<Segment>,
        evaluator: impl RightsEvaluator + 'static,
    ) -> Self {
        AclRule {
            sequence_number,
            rule,
            evaluator: Box::new(evaluator),
        }
    }

    /// Convenience constructor parsing a `"/a/*/c"`-style rule path into
    /// classified segments (see [`Segment::classify`]). This is a small
    /// segment-kind classifier, not the authz-file parser itself.
    pub fn from_path(
        sequence_number: i64,
        path: &str,
        evaluator: impl RightsEvaluator + 'static,
    ) -> Self {
        let rule = crate::lookup::split_path(path)
            .into_iter()
            .map(Segment::classify)
            .collect();
        AclRule::new(sequence_number, rule, evaluator)
    }
}
