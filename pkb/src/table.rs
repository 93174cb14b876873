use std::collections::{BTreeSet, HashMap};

/// Interns the names of one entity category. Indices are assigned in
/// first-insertion order and never change.
#[derive(Debug, Default, Clone)]
pub struct Table {
    elements: Vec<String>,
    indices: HashMap<String, u32>,
}

impl Table {
    /// Returns the index of `element`, inserting it first if it is new.
    pub fn insert(&mut self, element: &str) -> u32 {
        if let Some(&index) = self.indices.get(element) {
            return index;
        }

        let index = self.elements.len() as u32;
        self.elements.push(element.to_string());
        self.indices.insert(element.to_string(), index);
        index
    }

    pub fn index_of(&self, element: &str) -> Option<u32> {
        self.indices.get(element).copied()
    }

    pub fn element_at(&self, index: u32) -> Option<&str> {
        self.elements.get(index as usize).map(String::as_str)
    }

    pub fn all_indices(&self) -> BTreeSet<u32> {
        (0..self.elements.len() as u32).collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::single(&["x"], &[0])]
    #[case::distinct(&["x", "y", "z"], &[0, 1, 2])]
    #[case::repeated(&["x", "y", "x", "y", "x"], &[0, 1, 0, 1, 0])]
    fn test_insert_is_stable(#[case] names: &[&str], #[case] expected: &[u32]) {
        let mut table = Table::default();

        let indices = names.iter().map(|name| table.insert(name)).collect::<Vec<_>>();

        assert_eq!(indices, expected);
    }

    #[test]
    fn test_lookup_both_ways() {
        let mut table = Table::default();
        table.insert("cenX");
        table.insert("y");

        assert_eq!(table.index_of("y"), Some(1));
        assert_eq!(table.element_at(0), Some("cenX"));
        assert_eq!(table.all_indices(), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_missing_entries_are_absent() {
        let table = Table::default();

        assert_eq!(table.index_of("x"), None);
        assert_eq!(table.element_at(3), None);
        assert!(table.is_empty());
    }
}
