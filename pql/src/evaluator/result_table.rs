use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// One consistent assignment of values to synonyms.
pub type Row = BTreeMap<String, u32>;

/// Distinct values currently bound per synonym, read by the optimizer.
pub type SynonymCounts = HashMap<String, usize>;

/// Outcome of a single clause.
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseResult {
    Boolean(bool),
    Column {
        synonym: String,
        values: BTreeSet<u32>,
    },
    Pairs {
        left: String,
        right: String,
        pairs: Vec<(u32, u32)>,
    },
}

impl ClauseResult {
    /// Pairs over a single synonym collapse to the values equal on both
    /// sides.
    pub fn pairs(left: &str, right: &str, pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        if left == right {
            return ClauseResult::Column {
                synonym: left.to_string(),
                values: pairs
                    .into_iter()
                    .filter(|(l, r)| l == r)
                    .map(|(l, _)| l)
                    .collect(),
            };
        }

        ClauseResult::Pairs {
            left: left.to_string(),
            right: right.to_string(),
            pairs: pairs.into_iter().unique().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ClauseResult::Boolean(holds) => usize::from(*holds),
            ClauseResult::Column { values, .. } => values.len(),
            ClauseResult::Pairs { pairs, .. } => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rows over a fixed synonym set. The unit table binds nothing and holds a
/// single empty row, so merging into it yields the incoming rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    synonyms: BTreeSet<String>,
    rows: Vec<Row>,
}

impl Default for ResultTable {
    fn default() -> Self {
        Self {
            synonyms: BTreeSet::new(),
            rows: vec![Row::new()],
        }
    }
}

impl ResultTable {
    pub fn column(synonym: &str, values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            synonyms: BTreeSet::from([synonym.to_string()]),
            rows: values
                .into_iter()
                .map(|value| Row::from([(synonym.to_string(), value)]))
                .collect(),
        }
    }

    pub fn pairs(left: &str, right: &str, pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self {
            synonyms: BTreeSet::from([left.to_string(), right.to_string()]),
            rows: pairs
                .into_iter()
                .map(|(l, r)| Row::from([(left.to_string(), l), (right.to_string(), r)]))
                .collect(),
        }
    }

    pub fn synonyms(&self) -> &BTreeSet<String> {
        &self.synonyms
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_bound(&self, synonym: &str) -> bool {
        self.synonyms.contains(synonym)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values_of(&self, synonym: &str) -> BTreeSet<u32> {
        self.rows
            .iter()
            .filter_map(|row| row.get(synonym).copied())
            .collect()
    }

    /// Distinct (left, right) value pairs of two bound synonyms.
    pub fn pairs_of(&self, left: &str, right: &str) -> BTreeSet<(u32, u32)> {
        self.rows
            .iter()
            .filter_map(|row| Some((*row.get(left)?, *row.get(right)?)))
            .collect()
    }

    pub fn synonym_counts(&self) -> SynonymCounts {
        self.synonyms
            .iter()
            .map(|synonym| (synonym.clone(), self.values_of(synonym).len()))
            .collect()
    }

    /// Folds a clause outcome into the table. Returns whether any row
    /// survives, which is the clause's truth value for boolean outcomes.
    pub fn merge_clause(&mut self, result: ClauseResult) -> bool {
        let incoming = match result {
            ClauseResult::Boolean(holds) => return holds,
            ClauseResult::Column { synonym, values } => ResultTable::column(&synonym, values),
            ClauseResult::Pairs { left, right, pairs } => ResultTable::pairs(&left, &right, pairs),
        };

        self.merge(incoming);
        !self.is_empty()
    }

    /// Merges another table: cross product when no synonym is shared, filter
    /// when every incoming synonym is already bound, inner join otherwise.
    pub fn merge(&mut self, incoming: ResultTable) {
        let shared = self
            .synonyms
            .intersection(&incoming.synonyms)
            .cloned()
            .collect::<Vec<_>>();

        if shared.is_empty() {
            self.cross_product(incoming);
        } else if incoming.synonyms.is_subset(&self.synonyms) {
            self.filter(incoming, &shared);
        } else {
            self.inner_join(incoming, &shared);
        }
    }

    fn cross_product(&mut self, incoming: ResultTable) {
        let rows = self
            .rows
            .iter()
            .cartesian_product(incoming.rows.iter())
            .map(|(row, other)| {
                let mut row = row.clone();
                row.extend(other.iter().map(|(synonym, value)| (synonym.clone(), *value)));
                row
            })
            .collect();

        self.rows = rows;
        self.synonyms.extend(incoming.synonyms);
    }

    fn filter(&mut self, incoming: ResultTable, shared: &[String]) {
        let keys = incoming
            .rows
            .iter()
            .map(|row| key_of(row, shared))
            .collect::<HashSet<_>>();

        self.rows.retain(|row| keys.contains(&key_of(row, shared)));
    }

    fn inner_join(&mut self, incoming: ResultTable, shared: &[String]) {
        let mut by_key: HashMap<Vec<u32>, Vec<Row>> = HashMap::new();
        for row in incoming.rows {
            by_key.entry(key_of(&row, shared)).or_default().push(row);
        }

        let mut rows = Vec::new();
        for row in &self.rows {
            let Some(matches) = by_key.get(&key_of(row, shared)) else {
                continue;
            };
            for other in matches {
                let mut joined = row.clone();
                joined.extend(other.iter().map(|(synonym, value)| (synonym.clone(), *value)));
                rows.push(joined);
            }
        }

        self.rows = rows;
        self.synonyms.extend(incoming.synonyms);
    }

    /// Keeps only the given synonyms, dropping rows that become duplicates.
    pub fn project(&self, synonyms: &[String]) -> ResultTable {
        let kept = synonyms
            .iter()
            .filter(|synonym| self.is_bound(synonym))
            .cloned()
            .collect::<BTreeSet<_>>();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(synonym, _)| kept.contains(*synonym))
                    .map(|(synonym, value)| (synonym.clone(), *value))
                    .collect::<Row>()
            })
            .unique()
            .collect();

        ResultTable {
            synonyms: kept,
            rows,
        }
    }
}

fn key_of(row: &Row, synonyms: &[String]) -> Vec<u32> {
    synonyms
        .iter()
        .filter_map(|synonym| row.get(synonym).copied())
        .collect()
}
