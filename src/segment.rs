//! Segment model and matching primitives.

use std::fmt;

/// The pattern category of one path segment (a component between `/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// An exact, literal segment.
    Literal,
    /// `*` — matches exactly one arbitrary segment.
    Any,
    /// `**` — matches zero or more whole segments.
    AnyRecursive,
    /// `prefix*` — matches any segment starting with `prefix`.
    Prefix,
    /// `*suffix` — matches any segment ending with `suffix`.
    Suffix,
    /// A general shell glob (`*`, `?`, `[...]` mixed in non-trivial ways).
    Fnmatch,
}

/// One path segment from an ACL rule: its textual pattern plus its kind.
///
/// In the upstream parser (out of scope here) the `pattern` field is
/// interned; we do not intern it here, so equality falls back to
/// `(kind, pattern)` string comparison — a small constant-factor slowdown
/// that's acceptable given how small a filtered tree's rule set typically is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub kind: SegmentKind,
    pub pattern: String,
}

impl Segment {
    pub fn literal(s: impl Into<String>) -> Self {
        Segment {
            kind: SegmentKind::Literal,
            pattern: s.into(),
        }
    }

    pub fn any() -> Self {
        Segment {
            kind: SegmentKind::Any,
            pattern: "*".to_string(),
        }
    }

    pub fn any_recursive() -> Self {
        Segment {
            kind: SegmentKind::AnyRecursive,
            pattern: "**".to_string(),
        }
    }

    pub fn prefix(p: impl Into<String>) -> Self {
        Segment {
            kind: SegmentKind::Prefix,
            pattern: p.into(),
        }
    }

    pub fn suffix(s: impl Into<String>) -> Self {
        Segment {
            kind: SegmentKind::Suffix,
            pattern: s.into(),
        }
    }

    pub fn fnmatch(glob: impl Into<String>) -> Self {
        Segment {
            kind: SegmentKind::Fnmatch,
            pattern: glob.into(),
        }
    }

    /// Classify a raw textual segment (as it would appear between `/` in an
    /// authz rule path) into its `Segment`.
    ///
    /// This is *not* the authz-file parser: it performs no group expansion
    /// and touches no filesystem. It only implements the
    /// literal/`*`/`**`/`prefix*`/`*suffix`/glob dispatch, so tests and
    /// callers building `AclRule`s by hand don't need to hand-construct
    /// `Segment` values.
    pub fn classify(raw: &str) -> Segment {
        if raw == "**" {
            return Segment::any_recursive();
        }
        if raw == "*" {
            return Segment::any();
        }
        let star_count = raw.bytes().filter(|&b| b == b'*').count();
        let has_class = raw.contains('[') && raw.contains(']');
        let has_question = raw.contains('?');
        if !has_class && !has_question && star_count == 1 {
            if let Some(prefix) = raw.strip_suffix('*') {
                if !prefix.is_empty() {
                    return Segment::prefix(prefix);
                }
            }
            if let Some(suffix) = raw.strip_prefix('*') {
                if !suffix.is_empty() {
                    return Segment::suffix(suffix);
                }
            }
        }
        if has_class || has_question || star_count > 0 {
            return Segment::fnmatch(raw);
        }
        Segment::literal(raw)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// True iff `node_segment` is a byte-wise prefix of `query_segment`.
pub fn match_prefix(node_segment: &str, query_segment: &str) -> bool {
    query_segment.as_bytes().starts_with(node_segment.as_bytes())
}

/// Standard shell glob (`*`, `?`, `[...]`) over the whole segment.
///
/// Empty query segments are permitted; they match only the empty glob.
pub fn match_glob(pattern: &str, query_segment: &str) -> bool {
    match glob::Pattern::new(pattern) {
        Ok(p) => p.matches(query_segment),
        Err(_) => false,
    }
}

/// Reverse `s` byte-for-byte (segments are plain path components, never
/// containing multi-byte sequences that would make byte reversal unsafe to
/// treat as UTF-8... in general they can; we reverse by `char` to stay
/// correct for non-ASCII segment names) into `buf`, clearing `buf` first.
///
/// Used so the suffix search in the lookup engine can reuse the same
/// prefix-range binary search the `prefixes` pattern children use.
pub fn reverse_in_place(buf: &mut String, s: &str) {
    buf.clear();
    buf.extend(s.chars().rev());
}
