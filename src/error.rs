//! Error kinds the core may produce.
//!
//! Everything else — unmatched paths, denied access, recursive denial — is
//! an *answer*, not an error: those return `Ok(false)`.

/// Grounded in `pbs-tape::tape_read::BlockReadError`'s shape: a small,
/// flat `thiserror` enum with one-line messages and no nested causes, so
/// callers can match on the kind instead of parsing an `anyhow::Error`
/// string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Two ACLs claimed the same leaf. The builder asserts this cannot
    /// happen once the upstream parser has rejected duplicate sections; we
    /// still treat it as a runtime check rather than omit it, since this
    /// crate has no way to verify that precondition itself.
    #[error("configuration invariant violated: two ACLs target the same leaf at '{path}'")]
    ConfigurationInvariantViolated { path: String },

    /// A non-null query path did not start with `/`.
    #[error("malformed path '{path}': must start with '/'")]
    MalformedPath { path: String },
}
