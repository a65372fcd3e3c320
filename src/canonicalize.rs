use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonicalize a list of tags.
///
/// - Tags are lower-cased (ASCII).
/// - The result is sorted ascending (BTreeSet guarantees this).
/// - Duplicates are removed.
pub fn canonicalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|t| t.as_ref().to_ascii_lowercase())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// A set of server tags held in canonical form.
///
/// Two tag sets are equal iff their canonical forms are equal, so
/// comparison is insensitive to order, case and repetition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new<S: AsRef<str>>(tags: &[S]) -> Self {
        Self {
            tags: canonicalize_tags(tags),
        }
    }

    /// The canonical tags: lower-case, sorted, unique.
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        Self::new(&tags)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.tags
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let tags: Vec<String> = iter.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::new(&tags)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tags.join(", "))
    }
}
