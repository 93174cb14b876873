use crate::evaluator::cache::{CacheKey, Direction, RelationCache};
use crate::evaluator::relationship_evaluator::RelationshipEvaluator;
use pkb::pkb_context::PkbContext;
use pkb::relationship::{ParamPosition, RelationshipType, StmtNo};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use tracing::trace;

/// Next* and NextBip*, answered by walking the stored control flow graphs.
pub struct NextEvaluator<'a> {
    pkb: &'a PkbContext,
    cache: RelationCache,
    pairs: HashMap<RelationshipType, Rc<Vec<(StmtNo, StmtNo)>>>,
}

impl<'a> NextEvaluator<'a> {
    pub fn new(pkb: &'a PkbContext, cache_capacity: usize) -> Self {
        Self {
            pkb,
            cache: RelationCache::new(cache_capacity),
            pairs: HashMap::new(),
        }
    }

    /// The stored single step relation a closure walks over.
    fn step_of(rs: RelationshipType) -> RelationshipType {
        match rs {
            RelationshipType::NextT => RelationshipType::Next,
            RelationshipType::NextBipT => RelationshipType::NextBip,
            _ => panic!("{} is not served by the Next evaluator", rs),
        }
    }

    fn step(&self, rs: RelationshipType, direction: Direction, from: StmtNo) -> &'a HashSet<StmtNo> {
        let pkb = self.pkb;
        match direction {
            Direction::Forward => pkb.get_right(Self::step_of(rs), from),
            Direction::Backward => pkb.get_left(Self::step_of(rs), from),
        }
    }

    fn reachable(&mut self, rs: RelationshipType, direction: Direction, bound: Option<StmtNo>) -> Rc<HashSet<StmtNo>> {
        let key = CacheKey::new(rs, direction, bound);
        if let Some(values) = self.cache.get(&key) {
            return values;
        }

        let values = match bound {
            Some(start) => self.walk(rs, direction, start),
            // the closure has the same endpoints as the single step relation
            None => {
                let position = match direction {
                    Direction::Forward => ParamPosition::Right,
                    Direction::Backward => ParamPosition::Left,
                };
                self.pkb
                    .get_mappings(Self::step_of(rs), position)
                    .iter()
                    .map(|mapping| mapping[0])
                    .collect()
            }
        };

        trace!(rs = %rs, ?direction, ?bound, size = values.len(), "next.walk");
        let values = Rc::new(values);
        self.cache.put(key, Rc::clone(&values));
        values
    }

    fn walk(&self, rs: RelationshipType, direction: Direction, start: StmtNo) -> HashSet<StmtNo> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(statement) = queue.pop_front() {
            for &next in self.step(rs, direction, statement) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }
}

impl RelationshipEvaluator for NextEvaluator<'_> {
    fn holds(&mut self, rs: RelationshipType, left: Option<u32>, right: Option<u32>) -> bool {
        match (left, right) {
            (Some(left), Some(right)) => self.reachable(rs, Direction::Forward, Some(left)).contains(&right),
            (Some(left), None) => !self.step(rs, Direction::Forward, left).is_empty(),
            (None, Some(right)) => !self.step(rs, Direction::Backward, right).is_empty(),
            (None, None) => !self
                .pkb
                .get_mappings(Self::step_of(rs), ParamPosition::Both)
                .is_empty(),
        }
    }

    fn rights(&mut self, rs: RelationshipType, left: Option<u32>) -> Rc<HashSet<u32>> {
        self.reachable(rs, Direction::Forward, left)
    }

    fn lefts(&mut self, rs: RelationshipType, right: Option<u32>) -> Rc<HashSet<u32>> {
        self.reachable(rs, Direction::Backward, right)
    }

    fn pairs(&mut self, rs: RelationshipType) -> Rc<Vec<(u32, u32)>> {
        if let Some(pairs) = self.pairs.get(&rs) {
            return Rc::clone(pairs);
        }

        let pkb = self.pkb;
        let mut pairs = Vec::new();
        for &statement in pkb.statements() {
            let reachable = self.reachable(rs, Direction::Forward, Some(statement));
            pairs.extend(reachable.iter().map(|&next| (statement, next)));
        }

        let pairs = Rc::new(pairs);
        self.pairs.insert(rs, Rc::clone(&pairs));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::test_support::sample_pkb;
    use rstest::rstest;

    #[rstest]
    #[case::into_loop(RelationshipType::NextT, 1, &[2, 3, 4, 5, 6])]
    #[case::loop_reaches_itself(RelationshipType::NextT, 2, &[2, 3, 4, 5, 6])]
    #[case::end_of_procedure(RelationshipType::NextT, 9, &[])]
    #[case::across_calls(RelationshipType::NextBipT, 8, &[10, 9, 2, 3, 4, 5, 6, 7, 8])]
    #[case::callee_without_calls(RelationshipType::NextBipT, 10, &[9, 2, 3, 4, 5, 6, 7, 8, 10])]
    fn test_rights(#[case] rs: RelationshipType, #[case] from: StmtNo, #[case] expected: &[StmtNo]) {
        let pkb = sample_pkb();
        let mut evaluator = NextEvaluator::new(&pkb, 16);

        assert_eq!(
            *evaluator.rights(rs, Some(from)),
            expected.iter().copied().collect::<HashSet<_>>()
        );
    }

    #[test]
    fn test_holds_and_lefts() {
        let pkb = sample_pkb();
        let mut evaluator = NextEvaluator::new(&pkb, 16);
        let rs = RelationshipType::NextT;

        assert!(evaluator.holds(rs, Some(6), Some(5)));
        assert!(!evaluator.holds(rs, Some(5), Some(1)));
        assert!(!evaluator.holds(rs, Some(7), Some(10)));
        assert!(evaluator.holds(RelationshipType::NextBipT, Some(7), Some(10)));
        assert!(evaluator.holds(rs, None, Some(9)));
        assert!(!evaluator.holds(rs, Some(10), None));
        assert_eq!(*evaluator.lefts(rs, Some(9)), HashSet::from([7, 8]));
        assert_eq!(*evaluator.lefts(rs, None), HashSet::from([1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn test_pairs_are_memoised() {
        let pkb = sample_pkb();
        let mut evaluator = NextEvaluator::new(&pkb, 16);

        let first = evaluator.pairs(RelationshipType::NextT);
        let second = evaluator.pairs(RelationshipType::NextT);

        assert!(Rc::ptr_eq(&first, &second));
        // 1 reaches 5 statements, 2..6 reach 5 each, 7 reaches 2, 8 reaches 1
        assert_eq!(first.len(), 5 + 5 * 5 + 2 + 1);
    }
}
