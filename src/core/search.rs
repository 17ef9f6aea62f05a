use std::ops::Range;

use crate::core::store::UserId;

/// One slot of the prefix index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub username_lower: String,
    pub id: UserId,
}

/// Lexicographically sorted listing of (lowercase username, id) pairs.
/// Usernames never change after seeding, so the index is built once and
/// answers prefix lookups by binary search thereafter.
pub struct PrefixIndex {
    entries: Vec<IndexEntry>,
}

impl PrefixIndex {
    /// Build from the dense lowercase-name table. Equal names (only
    /// possible if duplicates were ever seeded) tie-break by id so the
    /// ordering never depends on sort stability.
    pub fn build(usernames_lower: &[String]) -> Self {
        let mut entries: Vec<IndexEntry> = usernames_lower
            .iter()
            .enumerate()
            .map(|(id, name)| IndexEntry {
                username_lower: name.clone(),
                id: id as UserId,
            })
            .collect();
        entries.sort_unstable_by(|a, b| {
            a.username_lower
                .cmp(&b.username_lower)
                .then(a.id.cmp(&b.id))
        });
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self, range: Range<usize>) -> &[IndexEntry] {
        &self.entries[range]
    }

    /// Half-open range of entries whose lowercase name starts with
    /// `prefix`. The upper bound uses a does-not-start-with predicate
    /// rather than a sentinel byte, so names may contain arbitrary UTF-8.
    pub fn prefix_range(&self, prefix: &str) -> Range<usize> {
        let lo = self
            .entries
            .partition_point(|entry| entry.username_lower.as_str() < prefix);
        let hi = self.entries.partition_point(|entry| {
            entry.username_lower.as_str() < prefix || entry.username_lower.starts_with(prefix)
        });
        lo..hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[&str]) -> PrefixIndex {
        let lower: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
        PrefixIndex::build(&lower)
    }

    fn matches(index: &PrefixIndex, prefix: &str) -> Vec<String> {
        index
            .entries(index.prefix_range(prefix))
            .iter()
            .map(|entry| entry.username_lower.clone())
            .collect()
    }

    #[test]
    fn entries_are_sorted_with_id_tiebreak() {
        let idx = index(&["carol", "Alice", "bob", "alice"]);
        let all: Vec<(String, UserId)> = idx
            .entries(0..idx.len())
            .iter()
            .map(|entry| (entry.username_lower.clone(), entry.id))
            .collect();
        assert_eq!(
            all,
            [
                ("alice".to_string(), 1),
                ("alice".to_string(), 3),
                ("bob".to_string(), 2),
                ("carol".to_string(), 0),
            ]
        );
    }

    #[test]
    fn prefix_range_returns_exactly_the_matches() {
        let idx = index(&["alice", "alina", "bob", "bobby", "carol"]);
        assert_eq!(matches(&idx, "al"), ["alice", "alina"]);
        assert_eq!(matches(&idx, "alice"), ["alice"]);
        assert_eq!(matches(&idx, "bob"), ["bob", "bobby"]);
        assert_eq!(matches(&idx, "c"), ["carol"]);
    }

    #[test]
    fn absent_prefixes_yield_empty_ranges() {
        let idx = index(&["alice", "bob", "carol"]);
        assert!(idx.prefix_range("zz").is_empty());
        assert!(idx.prefix_range("aa").is_empty());
        assert!(idx.prefix_range("alicea").is_empty());
        // between "bob" and "carol"
        assert!(idx.prefix_range("bz").is_empty());
    }

    #[test]
    fn prefix_range_handles_non_ascii_names() {
        let idx = index(&["zoe", "zoë", "zoë_two", "zz"]);
        assert_eq!(matches(&idx, "zoë"), ["zoë", "zoë_two"]);
        assert_eq!(matches(&idx, "zo"), ["zoe", "zoë", "zoë_two"]);
    }

    #[test]
    fn empty_index_matches_nothing() {
        let idx = index(&[]);
        assert!(idx.is_empty());
        assert!(idx.prefix_range("a").is_empty());
    }
}
