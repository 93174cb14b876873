use crate::evaluator::result_table::SynonymCounts;
use crate::query::clause::Clause;
use crate::query::Query;
use pkb::relationship::RelationshipType;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDetails {
    /// The group only decides whether the query holds; its rows are dropped.
    pub is_boolean_group: bool,
    pub selected_synonyms: Vec<String>,
}

/// Feeds clauses to the evaluator one group at a time.
#[cfg_attr(test, mockall::automock)]
pub trait QueryOptimizer {
    /// Advances to the next group, `None` once all groups are done.
    fn next_group_details(&mut self) -> Option<GroupDetails>;

    /// Next clause of the current group given the distinct values bound so
    /// far, `None` once the group is exhausted.
    fn next_clause(&mut self, synonym_counts: &SynonymCounts) -> Option<Clause>;
}

struct Group {
    details: GroupDetails,
    clauses: Vec<Clause>,
}

/// Groups clauses into connected components over shared synonyms. The
/// synonym free group runs first, then groups without selected synonyms,
/// then the rest.
pub struct GroupingOptimizer {
    groups: VecDeque<Group>,
    current: Vec<Clause>,
}

impl GroupingOptimizer {
    pub fn new(query: &Query) -> Self {
        let clauses = &query.select.clauses;
        let mut components = DisjointSet::default();
        for clause in clauses {
            let synonyms = clause.synonyms();
            for synonym in &synonyms {
                components.add(synonym);
            }
            for pair in synonyms.windows(2) {
                components.union(pair[0], pair[1]);
            }
        }

        let selected = query.selected_synonyms();
        let mut constant = Vec::new();
        let mut connected: Vec<(String, Vec<Clause>)> = Vec::new();
        for clause in clauses {
            let Some(first) = clause.synonyms().first().copied() else {
                constant.push(clause.clone());
                continue;
            };

            let root = components.find(first);
            match connected.iter_mut().find(|(group_root, _)| *group_root == root) {
                Some((_, group)) => group.push(clause.clone()),
                None => connected.push((root, vec![clause.clone()])),
            }
        }

        let mut groups = VecDeque::new();
        if !constant.is_empty() {
            groups.push_back(Group {
                details: GroupDetails {
                    is_boolean_group: true,
                    selected_synonyms: vec![],
                },
                clauses: constant,
            });
        }

        let mut selecting = Vec::new();
        for (root, clauses) in connected {
            let selected_synonyms = selected
                .iter()
                .filter(|synonym| components.contains(synonym) && components.find(synonym) == root)
                .map(|synonym| synonym.to_string())
                .collect::<Vec<_>>();

            let group = Group {
                details: GroupDetails {
                    is_boolean_group: selected_synonyms.is_empty(),
                    selected_synonyms,
                },
                clauses,
            };
            match group.details.is_boolean_group {
                true => groups.push_back(group),
                false => selecting.push(group),
            }
        }
        groups.extend(selecting);

        Self {
            groups,
            current: vec![],
        }
    }
}

impl QueryOptimizer for GroupingOptimizer {
    fn next_group_details(&mut self) -> Option<GroupDetails> {
        let group = self.groups.pop_front()?;
        self.current = group.clauses;
        Some(group.details)
    }

    fn next_clause(&mut self, synonym_counts: &SynonymCounts) -> Option<Clause> {
        let (index, _) = self
            .current
            .iter()
            .enumerate()
            .min_by_key(|(_, clause)| clause_cost(clause, synonym_counts))?;

        Some(self.current.remove(index))
    }
}

/// Lower is evaluated earlier: clauses touching bound synonyms, then fewer
/// unbound synonyms, then cheaper relationships, then fewer bound values.
fn clause_cost(clause: &Clause, synonym_counts: &SynonymCounts) -> (bool, usize, u8, usize) {
    let synonyms = clause.synonyms();
    let bound = synonyms
        .iter()
        .filter_map(|synonym| synonym_counts.get(*synonym))
        .collect::<Vec<_>>();

    let disconnected = !synonym_counts.is_empty() && bound.is_empty();
    let unbound = synonyms.len() - bound.len();
    let cardinality = bound.into_iter().sum();

    (disconnected, unbound, family_cost(clause), cardinality)
}

fn family_cost(clause: &Clause) -> u8 {
    match clause {
        Clause::With { .. } => 0,
        Clause::Pattern { .. } => 2,
        Clause::SuchThat { relationship, .. } => match relationship {
            RelationshipType::Follows
            | RelationshipType::Parent
            | RelationshipType::Next
            | RelationshipType::Calls => 1,
            RelationshipType::FollowsT
            | RelationshipType::ParentT
            | RelationshipType::CallsT
            | RelationshipType::NextBip
            | RelationshipType::UsesS
            | RelationshipType::UsesP
            | RelationshipType::ModifiesS
            | RelationshipType::ModifiesP => 2,
            RelationshipType::NextT | RelationshipType::NextBipT => 3,
            RelationshipType::Affects => 4,
            RelationshipType::AffectsT => 5,
        },
    }
}

#[derive(Default)]
struct DisjointSet {
    parents: HashMap<String, String>,
}

impl DisjointSet {
    fn add(&mut self, synonym: &str) {
        self.parents
            .entry(synonym.to_string())
            .or_insert_with(|| synonym.to_string());
    }

    fn contains(&self, synonym: &str) -> bool {
        self.parents.contains_key(synonym)
    }

    fn find(&self, synonym: &str) -> String {
        let mut current = synonym;
        while let Some(parent) = self.parents.get(current) {
            if parent == current {
                break;
            }
            current = parent;
        }
        current.to_string()
    }

    fn union(&mut self, left: &str, right: &str) {
        let left = self.find(left);
        let right = self.find(right);
        if left != right {
            self.parents.insert(right, left);
        }
    }
}
