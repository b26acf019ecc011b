//! Version identifiers and the release catalog.
//!
//! Versions are ordered segment by segment, numerically where a segment is a
//! number. Comparing the raw strings would put `1.9.0` above `1.10.0`.
//!
//! The index mixes full triples (`1.5.7`), two-segment releases (`0.12`) and
//! pre-releases (`1.10.0-alpha20240606`, `0.12.0-rc1`), which is why this is
//! not `semver::Version`: a two-segment release does not parse as semver.
//! Pre-release precedence still follows semver: `1.10.0-rc1 < 1.10.0`.

use std::cmp::Ordering;
use std::fmt;

/// One dot-separated piece of a version. Numbers sort below text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Number(u64),
    Text(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        raw.parse()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Number)
    }
}

fn segments(raw: &str) -> Vec<Segment> {
    raw.split('.').map(Segment::parse).collect()
}

/// Precedence key: release segments, then "is a final release", then
/// pre-release segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Precedence {
    release: Vec<Segment>,
    is_final: bool,
    pre: Vec<Segment>,
}

impl Precedence {
    fn of(raw: &str) -> Self {
        match raw.split_once('-') {
            Some((release, pre)) => Self {
                release: segments(release),
                is_final: false,
                pre: segments(pre),
            },
            None => Self {
                release: segments(raw),
                is_final: true,
                pre: Vec::new(),
            },
        }
    }
}

/// A release identifier such as `1.0.5`.
///
/// Equality is textual; ordering is by precedence, with the raw text as a
/// tie-breaker so that the order stays total (`01.0` and `1.0` differ).
#[derive(Debug, Clone)]
pub struct VersionId {
    raw: String,
    precedence: Precedence,
}

impl VersionId {
    /// Wraps a version string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let precedence = Precedence::of(&raw);
        Self { raw, precedence }
    }

    /// The version as it appears in the release index.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for VersionId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for VersionId {}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence
            .cmp(&other.precedence)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Available versions for this run, newest first.
///
/// Built from a fresh index fetch every time; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseCatalog {
    versions: Vec<VersionId>,
}

impl ReleaseCatalog {
    /// Builds a catalog from versions in any order, sorting newest first and
    /// dropping duplicates.
    #[must_use]
    pub fn from_unsorted(mut versions: Vec<VersionId>) -> Self {
        versions.sort_unstable_by(|a, b| b.cmp(a));
        versions.dedup();
        Self { versions }
    }

    /// The newest version, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&VersionId> {
        self.versions.first()
    }

    /// Iterates newest to oldest.
    pub fn iter(&self) -> std::slice::Iter<'_, VersionId> {
        self.versions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl<'a> IntoIterator for &'a ReleaseCatalog {
    type Item = &'a VersionId;
    type IntoIter = std::slice::Iter<'a, VersionId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
