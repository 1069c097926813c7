use std::collections::BTreeSet;

/// Idempotent identifier set for "seen" and "caught" records.
pub trait IdSet {
    fn contains(&self, id: &str) -> bool;

    /// Returns `true` if the id was not present before.
    fn add(&mut self, id: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryIdSet {
    ids: BTreeSet<String>,
}

impl MemoryIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl FromIterator<String> for MemoryIdSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl IdSet for MemoryIdSet {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn add(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut ids = MemoryIdSet::new();
        assert!(ids.add("react_001"));
        assert!(!ids.add("react_001"));
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("react_001"));
    }

    #[test]
    fn iterates_in_sorted_order() {
        let ids: MemoryIdSet = ["b".to_string(), "a".to_string()].into_iter().collect();
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
