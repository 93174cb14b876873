use crate::evaluator::cache::{CacheKey, Direction, RelationCache};
use crate::evaluator::relationship_evaluator::RelationshipEvaluator;
use pkb::pkb_context::PkbContext;
use pkb::relationship::{RelationshipType, StatementKind, StmtNo, TableIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use tracing::{debug, trace};

/// Assignments whose value may reach a statement, per variable.
type Definitions = BTreeMap<TableIndex, BTreeSet<StmtNo>>;

/// Affects and Affects* over the intra-procedural control flow graph.
pub struct AffectsEvaluator<'a> {
    pkb: &'a PkbContext,
    cache: RelationCache,
    all_pairs: Option<Rc<Vec<(StmtNo, StmtNo)>>>,
    all_pairs_t: Option<Rc<Vec<(StmtNo, StmtNo)>>>,
}

impl<'a> AffectsEvaluator<'a> {
    pub fn new(pkb: &'a PkbContext, cache_capacity: usize) -> Self {
        Self {
            pkb,
            cache: RelationCache::new(cache_capacity),
            all_pairs: None,
            all_pairs_t: None,
        }
    }

    fn check(rs: RelationshipType) {
        if !matches!(rs, RelationshipType::Affects | RelationshipType::AffectsT) {
            panic!("{} is not served by the Affects evaluator", rs);
        }
    }

    fn is_assign(&self, statement: StmtNo) -> bool {
        self.pkb.is_statement_of(StatementKind::Assign, statement)
    }

    /// Assignments, reads and calls overwrite the variables they modify.
    /// Containers only modify through their children.
    fn kills(&self, statement: StmtNo, variable: TableIndex) -> bool {
        matches!(
            self.pkb.kind_of(statement),
            Some(StatementKind::Assign | StatementKind::Read | StatementKind::Call)
        ) && self.pkb.is_rs(RelationshipType::ModifiesS, statement, variable)
    }

    fn direct(&mut self, direction: Direction, statement: StmtNo) -> Rc<HashSet<StmtNo>> {
        let key = CacheKey::new(RelationshipType::Affects, direction, Some(statement));
        if let Some(values) = self.cache.get(&key) {
            return values;
        }

        let values = match direction {
            Direction::Forward => self.affected_by(statement),
            Direction::Backward => self.affecting(statement),
        };
        let values = Rc::new(values);
        self.cache.put(key, Rc::clone(&values));
        values
    }

    fn affected_by(&self, source: StmtNo) -> HashSet<StmtNo> {
        let mut affected = HashSet::new();
        if !self.is_assign(source) {
            return affected;
        }
        let Some(variable) = self.pkb.written_variable(source) else {
            return affected;
        };

        let next = self.pkb.next();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        for &statement in next.next_statements(source) {
            if visited.insert(statement) {
                queue.push_back(statement);
            }
        }

        while let Some(statement) = queue.pop_front() {
            if self.is_assign(statement)
                && self.pkb.is_rs(RelationshipType::UsesS, statement, variable)
            {
                affected.insert(statement);
            }
            if self.kills(statement, variable) {
                continue;
            }
            for &following in next.next_statements(statement) {
                if visited.insert(following) {
                    queue.push_back(following);
                }
            }
        }

        affected
    }

    fn affecting(&self, target: StmtNo) -> HashSet<StmtNo> {
        let mut affecting = HashSet::new();
        if !self.is_assign(target) {
            return affecting;
        }

        let next = self.pkb.next();
        for &variable in self.pkb.get_right(RelationshipType::UsesS, target) {
            let mut visited = HashSet::new();
            let mut queue = VecDeque::new();
            for &statement in next.previous_statements(target) {
                if visited.insert(statement) {
                    queue.push_back(statement);
                }
            }

            while let Some(statement) = queue.pop_front() {
                if self.kills(statement, variable) {
                    if self.is_assign(statement) {
                        affecting.insert(statement);
                    }
                    continue;
                }
                for &previous in next.previous_statements(statement) {
                    if visited.insert(previous) {
                        queue.push_back(previous);
                    }
                }
            }
        }

        affecting
    }

    /// Closure of the direct relation from one statement, memoised per
    /// statement and direction.
    fn transitive(&mut self, direction: Direction, statement: StmtNo) -> Rc<HashSet<StmtNo>> {
        let key = CacheKey::new(RelationshipType::AffectsT, direction, Some(statement));
        if let Some(values) = self.cache.get(&key) {
            return values;
        }

        let mut reached = HashSet::new();
        let mut queue = VecDeque::from([statement]);
        while let Some(current) = queue.pop_front() {
            for &other in self.direct(direction, current).iter() {
                if reached.insert(other) {
                    queue.push_back(other);
                }
            }
        }

        trace!(?direction, statement, size = reached.len(), "affects.closure");
        let reached = Rc::new(reached);
        self.cache.put(key, Rc::clone(&reached));
        reached
    }

    fn lookup(&mut self, rs: RelationshipType, direction: Direction, statement: StmtNo) -> Rc<HashSet<StmtNo>> {
        match rs {
            RelationshipType::Affects => self.direct(direction, statement),
            _ => self.transitive(direction, statement),
        }
    }

    fn all_pairs(&mut self) -> Rc<Vec<(StmtNo, StmtNo)>> {
        if let Some(pairs) = &self.all_pairs {
            return Rc::clone(pairs);
        }

        let pairs = Rc::new(self.reaching_definitions());
        debug!(pairs = pairs.len(), "affects.all_pairs");
        self.all_pairs = Some(Rc::clone(&pairs));
        pairs
    }

    fn all_pairs_t(&mut self) -> Rc<Vec<(StmtNo, StmtNo)>> {
        if let Some(pairs) = &self.all_pairs_t {
            return Rc::clone(pairs);
        }

        let sources = self
            .all_pairs()
            .iter()
            .map(|&(source, _)| source)
            .collect::<BTreeSet<_>>();
        let mut pairs = Vec::new();
        for source in sources {
            let reached = self.transitive(Direction::Forward, source);
            let mut reached = reached.iter().copied().collect::<Vec<_>>();
            reached.sort_unstable();
            pairs.extend(reached.into_iter().map(|target| (source, target)));
        }

        let pairs = Rc::new(pairs);
        self.all_pairs_t = Some(Rc::clone(&pairs));
        pairs
    }

    /// Forward dataflow from the first statement of every procedure. Each
    /// assignment pairs with the reaching definitions of the variables it
    /// uses.
    fn reaching_definitions(&self) -> Vec<(StmtNo, StmtNo)> {
        let next = self.pkb.next();
        let mut incoming: HashMap<StmtNo, Definitions> = HashMap::new();
        let mut outgoing: HashMap<StmtNo, Definitions> = HashMap::new();
        let mut worklist = self.pkb.affects_info().first_statements().collect::<VecDeque<_>>();
        let mut queued = worklist.iter().copied().collect::<HashSet<_>>();

        while let Some(statement) = worklist.pop_front() {
            queued.remove(&statement);

            let mut definitions = Definitions::new();
            for previous in next.previous_statements(statement) {
                for (variable, sources) in outgoing.get(previous).into_iter().flatten() {
                    definitions
                        .entry(*variable)
                        .or_default()
                        .extend(sources.iter().copied());
                }
            }

            let out = self.transfer(statement, &definitions);
            incoming.insert(statement, definitions);
            if outgoing.get(&statement) != Some(&out) {
                outgoing.insert(statement, out);
                for &following in next.next_statements(statement) {
                    if queued.insert(following) {
                        worklist.push_back(following);
                    }
                }
            }
        }

        let mut pairs = Vec::new();
        for (&statement, definitions) in &incoming {
            if !self.is_assign(statement) {
                continue;
            }
            for variable in self.pkb.get_right(RelationshipType::UsesS, statement) {
                for &source in definitions.get(variable).into_iter().flatten() {
                    pairs.push((source, statement));
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn transfer(&self, statement: StmtNo, definitions: &Definitions) -> Definitions {
        let mut out = definitions.clone();
        match self.pkb.kind_of(statement) {
            Some(StatementKind::Assign) => {
                if let Some(variable) = self.pkb.written_variable(statement) {
                    out.insert(variable, BTreeSet::from([statement]));
                }
            }
            Some(StatementKind::Read | StatementKind::Call) => {
                for variable in self.pkb.get_right(RelationshipType::ModifiesS, statement) {
                    out.remove(variable);
                }
            }
            _ => {}
        }
        out
    }
}

impl RelationshipEvaluator for AffectsEvaluator<'_> {
    fn holds(&mut self, rs: RelationshipType, left: Option<u32>, right: Option<u32>) -> bool {
        Self::check(rs);
        match (left, right) {
            (Some(left), Some(right)) => self.lookup(rs, Direction::Forward, left).contains(&right),
            (Some(left), None) => !self.direct(Direction::Forward, left).is_empty(),
            (None, Some(right)) => !self.direct(Direction::Backward, right).is_empty(),
            (None, None) => !self.all_pairs().is_empty(),
        }
    }

    fn rights(&mut self, rs: RelationshipType, left: Option<u32>) -> Rc<HashSet<u32>> {
        Self::check(rs);
        match left {
            Some(left) => self.lookup(rs, Direction::Forward, left),
            None => Rc::new(self.all_pairs().iter().map(|&(_, right)| right).collect()),
        }
    }

    fn lefts(&mut self, rs: RelationshipType, right: Option<u32>) -> Rc<HashSet<u32>> {
        Self::check(rs);
        match right {
            Some(right) => self.lookup(rs, Direction::Backward, right),
            None => Rc::new(self.all_pairs().iter().map(|&(left, _)| left).collect()),
        }
    }

    fn pairs(&mut self, rs: RelationshipType) -> Rc<Vec<(u32, u32)>> {
        Self::check(rs);
        match rs {
            RelationshipType::Affects => self.all_pairs(),
            _ => self.all_pairs_t(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::test_support::{pkb_of, sample_pkb};
    use rstest::rstest;

    #[rstest]
    #[case::definition_reaches_loop(RelationshipType::Affects, 1, &[3])]
    #[case::loop_carried(RelationshipType::Affects, 3, &[3, 6])]
    #[case::else_branch_back_to_loop(RelationshipType::Affects, 6, &[3])]
    #[case::end_of_procedure(RelationshipType::Affects, 9, &[])]
    #[case::not_an_assignment(RelationshipType::Affects, 2, &[])]
    #[case::closure_through_loop(RelationshipType::AffectsT, 1, &[3, 6])]
    #[case::closure_of_cycle(RelationshipType::AffectsT, 6, &[3, 6])]
    fn test_affected(#[case] rs: RelationshipType, #[case] source: StmtNo, #[case] expected: &[StmtNo]) {
        let pkb = sample_pkb();
        let mut evaluator = AffectsEvaluator::new(&pkb, 32);

        assert_eq!(
            *evaluator.rights(rs, Some(source)),
            expected.iter().copied().collect::<HashSet<_>>()
        );
    }

    #[rstest]
    #[case::every_used_variable(RelationshipType::Affects, 3, &[1, 3, 6])]
    #[case::read_is_not_an_assignment(RelationshipType::Affects, 9, &[])]
    #[case::closure_backwards(RelationshipType::AffectsT, 6, &[1, 3, 6])]
    fn test_affecting(#[case] rs: RelationshipType, #[case] target: StmtNo, #[case] expected: &[StmtNo]) {
        let pkb = sample_pkb();
        let mut evaluator = AffectsEvaluator::new(&pkb, 32);

        assert_eq!(
            *evaluator.lefts(rs, Some(target)),
            expected.iter().copied().collect::<HashSet<_>>()
        );
    }

    #[test]
    fn test_all_pairs() {
        let pkb = sample_pkb();
        let mut evaluator = AffectsEvaluator::new(&pkb, 32);

        assert_eq!(
            *evaluator.pairs(RelationshipType::Affects),
            vec![(1, 3), (3, 3), (3, 6), (6, 3)]
        );
        assert_eq!(
            *evaluator.pairs(RelationshipType::AffectsT),
            vec![(1, 3), (1, 6), (3, 3), (3, 6), (6, 3), (6, 6)]
        );
        assert!(evaluator.holds(RelationshipType::Affects, None, None));
        assert!(evaluator.holds(RelationshipType::AffectsT, Some(1), Some(6)));
        assert!(!evaluator.holds(RelationshipType::Affects, Some(1), Some(6)));
        assert_eq!(*evaluator.rights(RelationshipType::Affects, None), HashSet::from([3, 6]));
    }

    #[test]
    fn test_dataflow_matches_forward_search() {
        let pkb = pkb_of(
            "procedure p {
                x = 1;
                y = x + 2;
                if (y > 3) then {
                    x = y;
                    read y;
                } else {
                    call q;
                }
                z = x + y;
                while (z < 10) {
                    z = z + x;
                }
            }
            procedure q {
                y = 5;
            }",
        );
        let mut evaluator = AffectsEvaluator::new(&pkb, 32);

        let mut searched = Vec::new();
        for &assign in pkb.assigns() {
            let mut targets = evaluator.rights(RelationshipType::Affects, Some(assign)).iter().copied().collect::<Vec<_>>();
            targets.sort_unstable();
            searched.extend(targets.into_iter().map(|target| (assign, target)));
        }

        assert_eq!(*evaluator.pairs(RelationshipType::Affects), searched);
        // the call kills y on the else branch, the read on the then branch
        assert!(!evaluator.holds(RelationshipType::Affects, Some(2), Some(7)));
        assert!(evaluator.holds(RelationshipType::Affects, Some(4), Some(7)));
        assert!(evaluator.holds(RelationshipType::Affects, Some(1), Some(7)));
        assert!(evaluator.holds(RelationshipType::Affects, Some(9), Some(9)));
    }
}
