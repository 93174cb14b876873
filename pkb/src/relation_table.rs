use crate::relationship::ParamPosition;
use std::collections::{HashMap, HashSet};

/// Forward and inverse adjacency of one relationship, plus the facts
/// projected to their left side, right side and both sides.
#[derive(Debug, Default)]
pub struct RelationTable {
    forward: HashMap<u32, HashSet<u32>>,
    inverse: HashMap<u32, HashSet<u32>>,
    lefts: HashSet<Vec<u32>>,
    rights: HashSet<Vec<u32>>,
    pairs: HashSet<Vec<u32>>,
    empty: HashSet<u32>,
}

impl RelationTable {
    pub fn insert(&mut self, left: u32, right: u32) {
        self.forward.entry(left).or_default().insert(right);
        self.inverse.entry(right).or_default().insert(left);
        self.lefts.insert(vec![left]);
        self.rights.insert(vec![right]);
        self.pairs.insert(vec![left, right]);
    }

    pub fn contains(&self, left: u32, right: u32) -> bool {
        self.forward
            .get(&left)
            .is_some_and(|rights| rights.contains(&right))
    }

    pub fn rights_of(&self, left: u32) -> &HashSet<u32> {
        self.forward.get(&left).unwrap_or(&self.empty)
    }

    pub fn lefts_of(&self, right: u32) -> &HashSet<u32> {
        self.inverse.get(&right).unwrap_or(&self.empty)
    }

    pub fn mappings(&self, position: ParamPosition) -> &HashSet<Vec<u32>> {
        match position {
            ParamPosition::Left => &self.lefts,
            ParamPosition::Right => &self.rights,
            ParamPosition::Both => &self.pairs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Pairs of the transitive closure of this relation. Cycles are allowed,
    /// each reachable node is visited once per source.
    pub fn transitive_closure(&self) -> Vec<(u32, u32)> {
        let mut closure = Vec::new();

        for &source in self.forward.keys() {
            let mut visited = HashSet::new();
            let mut stack = self.rights_of(source).iter().copied().collect::<Vec<_>>();

            while let Some(node) = stack.pop() {
                if !visited.insert(node) {
                    continue;
                }
                closure.push((source, node));
                stack.extend(self.rights_of(node).iter().copied());
            }
        }

        closure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_insertion_is_idempotent() {
        let mut table = RelationTable::default();
        table.insert(1, 2);
        table.insert(1, 2);

        assert_eq!(table.rights_of(1), &HashSet::from([2]));
        assert_eq!(table.lefts_of(2), &HashSet::from([1]));
        assert_eq!(table.mappings(ParamPosition::Both).len(), 1);
        assert_eq!(table.mappings(ParamPosition::Left).len(), 1);
        assert_eq!(table.mappings(ParamPosition::Right).len(), 1);
    }

    #[test]
    fn test_absent_keys_are_empty() {
        let table = RelationTable::default();

        assert!(!table.contains(1, 2));
        assert!(table.rights_of(7).is_empty());
        assert!(table.lefts_of(7).is_empty());
        assert!(table.mappings(ParamPosition::Both).is_empty());
    }

    #[test]
    fn test_transitive_closure_of_chain() {
        let mut table = RelationTable::default();
        table.insert(1, 2);
        table.insert(2, 3);

        let closure = table.transitive_closure().into_iter().sorted().collect::<Vec<_>>();

        assert_eq!(closure, vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_transitive_closure_of_cycle_terminates() {
        let mut table = RelationTable::default();
        table.insert(2, 3);
        table.insert(3, 2);

        let closure = table.transitive_closure().into_iter().sorted().collect::<Vec<_>>();

        assert_eq!(closure, vec![(2, 2), (2, 3), (3, 2), (3, 3)]);
    }
}
