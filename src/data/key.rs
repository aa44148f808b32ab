//! Hierarchical composite keys identifying rows of an abundance table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deepest hierarchy level a long-format table can carry.
pub const MAX_DEPTH: usize = 4;

/// An ordered path of category labels (e.g. subsystem level 1 → function).
///
/// Two keys are equal iff they have the same number of levels and every
/// level holds the same label. An empty label is a real level: `[A, ""]`
/// and `[A]` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HierarchicalKey(Vec<String>);

impl HierarchicalKey {
    /// Create a key from already-clean labels.
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    /// Create a key from raw input fields, stripping surrounding quotes.
    pub fn from_raw<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            fields
                .into_iter()
                .map(|f| strip_quotes(f.as_ref()).to_string())
                .collect(),
        )
    }

    /// Number of levels in the key.
    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Labels from the top level down.
    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Label of the deepest level, if the key has any levels.
    pub fn deepest(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Consume the key, returning its labels.
    pub fn into_labels(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for HierarchicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("@"))
    }
}

/// Strip any run of `"` characters from both ends of a field.
pub fn strip_quotes(field: &str) -> &str {
    field.trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_strips_quotes() {
        let key = HierarchicalKey::from_raw(["\"Carbohydrates\"", "\"\"Sugars\"", "plain"]);
        assert_eq!(key.labels(), &["Carbohydrates", "Sugars", "plain"]);
    }

    #[test]
    fn test_empty_level_is_distinct() {
        let short = HierarchicalKey::from_raw(["A"]);
        let padded = HierarchicalKey::from_raw(["A", ""]);
        assert_ne!(short, padded);
        assert_eq!(padded.depth(), 2);
        assert_eq!(padded.deepest(), Some(""));
    }

    #[test]
    fn test_delimiter_in_label_does_not_collide() {
        // Joined with '@' these would render identically.
        let a = HierarchicalKey::from_raw(["A@B", "C"]);
        let b = HierarchicalKey::from_raw(["A", "B@C"]);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_ordering_is_level_wise() {
        let mut keys = vec![
            HierarchicalKey::from_raw(["B", "A"]),
            HierarchicalKey::from_raw(["A", "C"]),
            HierarchicalKey::from_raw(["A", "B"]),
        ];
        keys.sort();
        assert_eq!(keys[0].to_string(), "A@B");
        assert_eq!(keys[2].to_string(), "B@A");
    }
}
