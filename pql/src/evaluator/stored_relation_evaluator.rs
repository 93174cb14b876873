use crate::evaluator::relationship_evaluator::RelationshipEvaluator;
use pkb::pkb_context::PkbContext;
use pkb::relationship::{ParamPosition, RelationshipType};
use std::collections::HashSet;
use std::rc::Rc;

/// Serves relationships whose facts were stored at extraction time.
pub struct StoredRelationEvaluator<'a> {
    pkb: &'a PkbContext,
}

impl<'a> StoredRelationEvaluator<'a> {
    pub fn new(pkb: &'a PkbContext) -> Self {
        Self { pkb }
    }

    fn check(rs: RelationshipType) {
        if rs.is_on_demand() {
            panic!("{} is not stored and must be served by its on-demand evaluator", rs);
        }
    }

    fn projection(&self, rs: RelationshipType, position: ParamPosition) -> HashSet<u32> {
        self.pkb
            .get_mappings(rs, position)
            .iter()
            .filter_map(|mapping| mapping.first().copied())
            .collect()
    }
}

impl RelationshipEvaluator for StoredRelationEvaluator<'_> {
    fn holds(&mut self, rs: RelationshipType, left: Option<u32>, right: Option<u32>) -> bool {
        Self::check(rs);
        match (left, right) {
            (Some(left), Some(right)) => self.pkb.is_rs(rs, left, right),
            (Some(left), None) => !self.pkb.get_right(rs, left).is_empty(),
            (None, Some(right)) => !self.pkb.get_left(rs, right).is_empty(),
            (None, None) => !self.pkb.get_mappings(rs, ParamPosition::Both).is_empty(),
        }
    }

    fn rights(&mut self, rs: RelationshipType, left: Option<u32>) -> Rc<HashSet<u32>> {
        Self::check(rs);
        match left {
            Some(left) => Rc::new(self.pkb.get_right(rs, left).clone()),
            None => Rc::new(self.projection(rs, ParamPosition::Right)),
        }
    }

    fn lefts(&mut self, rs: RelationshipType, right: Option<u32>) -> Rc<HashSet<u32>> {
        Self::check(rs);
        match right {
            Some(right) => Rc::new(self.pkb.get_left(rs, right).clone()),
            None => Rc::new(self.projection(rs, ParamPosition::Left)),
        }
    }

    fn pairs(&mut self, rs: RelationshipType) -> Rc<Vec<(u32, u32)>> {
        Self::check(rs);
        let pairs = self
            .pkb
            .get_mappings(rs, ParamPosition::Both)
            .iter()
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Rc::new(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkb() -> PkbContext {
        let mut pkb = PkbContext::default();
        pkb.add_rs(RelationshipType::Follows, 1, 2);
        pkb.add_rs(RelationshipType::Follows, 2, 3);
        pkb
    }

    #[test]
    fn test_stored_lookups() {
        let pkb = pkb();
        let mut evaluator = StoredRelationEvaluator::new(&pkb);
        let rs = RelationshipType::Follows;

        assert!(evaluator.holds(rs, Some(1), Some(2)));
        assert!(!evaluator.holds(rs, Some(1), Some(3)));
        assert!(evaluator.holds(rs, None, Some(3)));
        assert!(!evaluator.holds(rs, Some(3), None));
        assert!(evaluator.holds(rs, None, None));
        assert!(!evaluator.holds(RelationshipType::Parent, None, None));
        assert_eq!(*evaluator.rights(rs, None), HashSet::from([2, 3]));
        assert_eq!(*evaluator.lefts(rs, Some(3)), HashSet::from([2]));
        assert_eq!(evaluator.pairs(rs).len(), 2);
    }

    #[test]
    #[should_panic(expected = "on-demand evaluator")]
    fn test_on_demand_relationship_panics() {
        let pkb = pkb();
        StoredRelationEvaluator::new(&pkb).holds(RelationshipType::NextT, None, None);
    }
}
