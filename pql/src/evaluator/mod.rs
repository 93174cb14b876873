use crate::config::EvaluatorConfig;
use crate::evaluator::affects_evaluator::AffectsEvaluator;
use crate::evaluator::cancellation::CancellationToken;
use crate::evaluator::next_evaluator::NextEvaluator;
use crate::evaluator::pattern_evaluator::PatternEvaluator;
use crate::evaluator::relationship_evaluator::RelationshipEvaluator;
use crate::evaluator::result_table::{ClauseResult, ResultTable};
use crate::evaluator::stored_relation_evaluator::StoredRelationEvaluator;
use crate::evaluator::with_evaluator::WithEvaluator;
use crate::optimizer::QueryOptimizer;
use crate::query::clause::{Clause, ExpressionSpec, Param};
use crate::query::design_entity::DesignEntity;
use crate::query::Query;
use pkb::pkb_context::PkbContext;
use pkb::relationship::{RelationshipType, Side, TableType};
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

pub mod affects_evaluator;
pub mod cache;
pub mod cancellation;
pub mod next_evaluator;
pub mod pattern_evaluator;
pub mod relationship_evaluator;
pub mod result_table;
pub mod stored_relation_evaluator;
pub mod with_evaluator;

/// Answer of a query before projection. Each row holds one value per select
/// element, in select order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalQueryResults {
    Boolean(bool),
    Rows(Vec<Vec<u32>>),
}

/// Every value a synonym of `entity` may take.
pub(crate) fn domain(pkb: &PkbContext, entity: DesignEntity) -> BTreeSet<u32> {
    if let Some(table) = entity.table() {
        return pkb.all_elements_at(table);
    }
    match entity.statement_kind() {
        Some(kind) => pkb.statements_of(kind).clone(),
        None => pkb.statements().clone(),
    }
}

fn admits(pkb: &PkbContext, entity: DesignEntity, value: u32) -> bool {
    match entity.statement_kind() {
        Some(kind) => pkb.is_statement_of(kind, value),
        None => true,
    }
}

/// A resolved such that argument.
enum Operand<'q> {
    Value(u32),
    Wildcard,
    /// A name literal absent from its table.
    Unknown,
    Synonym {
        name: &'q str,
        entity: DesignEntity,
        bound: Option<BTreeSet<u32>>,
    },
}

impl Operand<'_> {
    fn fixed(&self) -> Option<u32> {
        match self {
            Operand::Value(value) => Some(*value),
            _ => None,
        }
    }
}

/// Evaluates one query against an immutable knowledge base. Owns its
/// intermediate tables and caches and is consumed by [`evaluate`].
///
/// [`evaluate`]: QueryEvaluator::evaluate
pub struct QueryEvaluator<'a> {
    pkb: &'a PkbContext,
    stored: StoredRelationEvaluator<'a>,
    next: NextEvaluator<'a>,
    affects: AffectsEvaluator<'a>,
    patterns: PatternEvaluator<'a>,
    with: WithEvaluator<'a>,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(pkb: &'a PkbContext, config: &EvaluatorConfig) -> Self {
        Self {
            pkb,
            stored: StoredRelationEvaluator::new(pkb),
            next: NextEvaluator::new(pkb, config.cache_capacity),
            affects: AffectsEvaluator::new(pkb, config.cache_capacity),
            patterns: PatternEvaluator::new(pkb),
            with: WithEvaluator::new(pkb),
        }
    }

    pub fn evaluate(
        mut self,
        query: &Query,
        optimizer: &mut dyn QueryOptimizer,
        token: &CancellationToken,
    ) -> FinalQueryResults {
        let mut results = ResultTable::default();

        while let Some(group) = optimizer.next_group_details() {
            debug!(
                boolean = group.is_boolean_group,
                selected = ?group.selected_synonyms,
                "query.group"
            );
            let mut table = ResultTable::default();

            while let Some(clause) = optimizer.next_clause(&table.synonym_counts()) {
                if !self.evaluate_clause(query, &clause, &mut table) {
                    debug!(?clause, "query.short_circuit");
                    return match query.is_boolean() {
                        true => FinalQueryResults::Boolean(false),
                        false => FinalQueryResults::Rows(vec![]),
                    };
                }

                if token.is_cancelled() {
                    warn!("query.cancelled");
                    if !group.is_boolean_group {
                        results.merge(table.project(&group.selected_synonyms));
                    }
                    return self.finish(query, results);
                }
            }

            if !group.is_boolean_group {
                results.merge(table.project(&group.selected_synonyms));
            }
        }

        self.finish(query, results)
    }

    fn evaluate_clause(&mut self, query: &Query, clause: &Clause, table: &mut ResultTable) -> bool {
        let result = match clause {
            Clause::SuchThat {
                relationship,
                left,
                right,
            } => self.evaluate_such_that(query, *relationship, left, right, table),
            Clause::Pattern {
                synonym,
                entity,
                variable,
                expression,
            } => self.evaluate_pattern(synonym, *entity, variable, expression),
            Clause::With { left, right } => self.with.evaluate(query, left, right, table),
        };

        trace!(?clause, size = result.len(), "query.clause");
        table.merge_clause(result)
    }

    fn relationship_evaluator(&mut self, rs: RelationshipType) -> &mut dyn RelationshipEvaluator {
        match rs {
            RelationshipType::NextT | RelationshipType::NextBipT => &mut self.next,
            RelationshipType::Affects | RelationshipType::AffectsT => &mut self.affects,
            _ => &mut self.stored,
        }
    }

    fn operand<'q>(&self, query: &Query, rs: RelationshipType, side: Side, param: &'q Param, table: &ResultTable) -> Operand<'q> {
        match (param, side) {
            (Param::Integer(value), Side::Statement) => Operand::Value(*value),
            (Param::Name(name), Side::Table(table_type)) => match self.pkb.index_of(table_type, name) {
                Some(index) => Operand::Value(index),
                None => Operand::Unknown,
            },
            (Param::Wildcard, _) => Operand::Wildcard,
            (Param::Synonym(name), _) => {
                let entity = query
                    .entity_of(name)
                    .unwrap_or_else(|| panic!("{} references undeclared synonym {}", rs, name));
                Operand::Synonym {
                    name,
                    entity,
                    bound: table.is_bound(name).then(|| table.values_of(name)),
                }
            }
            (param, _) => panic!("{} cannot take {:?} as an argument", rs, param),
        }
    }

    fn evaluate_such_that(
        &mut self,
        query: &Query,
        rs: RelationshipType,
        left: &Param,
        right: &Param,
        table: &ResultTable,
    ) -> ClauseResult {
        let pkb = self.pkb;
        let left = self.operand(query, rs, rs.left_side(), left, table);
        let right = self.operand(query, rs, rs.right_side(), right, table);
        let evaluator = self.relationship_evaluator(rs);

        match (left, right) {
            (Operand::Unknown, _) | (_, Operand::Unknown) => ClauseResult::Boolean(false),
            (
                Operand::Synonym {
                    name: left,
                    entity: left_entity,
                    bound: left_bound,
                },
                Operand::Synonym {
                    name: right,
                    entity: right_entity,
                    bound: right_bound,
                },
            ) => {
                let pairs = match (left_bound, right_bound) {
                    _ if left == right => {
                        let candidates = table
                            .is_bound(left)
                            .then(|| table.values_of(left))
                            .unwrap_or_else(|| domain(pkb, left_entity));
                        candidates
                            .into_iter()
                            .filter(|&value| evaluator.holds(rs, Some(value), Some(value)))
                            .map(|value| (value, value))
                            .collect::<Vec<_>>()
                    }
                    (Some(_), Some(_)) => table
                        .pairs_of(left, right)
                        .into_iter()
                        .filter(|&(l, r)| evaluator.holds(rs, Some(l), Some(r)))
                        .collect(),
                    (Some(lefts), None) => lefts
                        .into_iter()
                        .flat_map(|l| {
                            let mut rights = evaluator.rights(rs, Some(l)).iter().copied().collect::<Vec<_>>();
                            rights.sort_unstable();
                            rights.into_iter().map(move |r| (l, r))
                        })
                        .collect(),
                    (None, Some(rights)) => rights
                        .into_iter()
                        .flat_map(|r| {
                            let mut lefts = evaluator.lefts(rs, Some(r)).iter().copied().collect::<Vec<_>>();
                            lefts.sort_unstable();
                            lefts.into_iter().map(move |l| (l, r))
                        })
                        .collect(),
                    (None, None) => evaluator.pairs(rs).to_vec(),
                };

                ClauseResult::pairs(
                    left,
                    right,
                    pairs
                        .into_iter()
                        .filter(|&(l, r)| admits(pkb, left_entity, l) && admits(pkb, right_entity, r)),
                )
            }
            (
                Operand::Synonym {
                    name,
                    entity,
                    bound,
                },
                other,
            ) => {
                let other = other.fixed();
                let values = match bound {
                    Some(bound) => bound
                        .into_iter()
                        .filter(|&value| evaluator.holds(rs, Some(value), other))
                        .collect(),
                    None => evaluator.lefts(rs, other).iter().copied().collect::<BTreeSet<_>>(),
                };
                ClauseResult::Column {
                    synonym: name.to_string(),
                    values: values.into_iter().filter(|&value| admits(pkb, entity, value)).collect(),
                }
            }
            (
                other,
                Operand::Synonym {
                    name,
                    entity,
                    bound,
                },
            ) => {
                let other = other.fixed();
                let values = match bound {
                    Some(bound) => bound
                        .into_iter()
                        .filter(|&value| evaluator.holds(rs, other, Some(value)))
                        .collect(),
                    None => evaluator.rights(rs, other).iter().copied().collect::<BTreeSet<_>>(),
                };
                ClauseResult::Column {
                    synonym: name.to_string(),
                    values: values.into_iter().filter(|&value| admits(pkb, entity, value)).collect(),
                }
            }
            (left, right) => ClauseResult::Boolean(evaluator.holds(rs, left.fixed(), right.fixed())),
        }
    }

    fn evaluate_pattern(
        &self,
        synonym: &str,
        entity: DesignEntity,
        variable: &Param,
        expression: &ExpressionSpec,
    ) -> ClauseResult {
        let variable_name = match variable {
            Param::Name(name) => Some(name.as_str()),
            Param::Wildcard => None,
            Param::Synonym(variable) => {
                let pairs = match entity {
                    DesignEntity::Assign => self.patterns.evaluate_assign_pair_pattern(expression),
                    DesignEntity::If => self.patterns.evaluate_if_pair_pattern(),
                    DesignEntity::While => self.patterns.evaluate_while_pair_pattern(),
                    _ => panic!("{} synonyms cannot be pattern matched", entity),
                };
                return ClauseResult::pairs(synonym, variable, pairs);
            }
            param => panic!("pattern variable cannot be {:?}", param),
        };

        let values = match entity {
            DesignEntity::Assign => self.patterns.evaluate_assign_pattern(variable_name, expression),
            DesignEntity::If => self.patterns.evaluate_if_pattern(variable_name),
            DesignEntity::While => self.patterns.evaluate_while_pattern(variable_name),
            _ => panic!("{} synonyms cannot be pattern matched", entity),
        };

        ClauseResult::Column {
            synonym: synonym.to_string(),
            values,
        }
    }

    /// Selected synonyms no clause constrained take their whole domain.
    fn finish(self, query: &Query, mut results: ResultTable) -> FinalQueryResults {
        if query.is_boolean() {
            return FinalQueryResults::Boolean(true);
        }

        for synonym in query.selected_synonyms() {
            if results.is_bound(synonym) {
                continue;
            }
            let entity = query
                .entity_of(synonym)
                .unwrap_or_else(|| panic!("selected synonym {} is not declared", synonym));
            results.merge(ResultTable::column(synonym, domain(self.pkb, entity)));
        }

        let mut rows = results
            .rows()
            .iter()
            .map(|row| {
                query
                    .select_elements()
                    .iter()
                    .filter_map(|element| row.get(element.synonym()).copied())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        rows.sort_unstable();
        rows.dedup();

        debug!(rows = rows.len(), "query.done");
        FinalQueryResults::Rows(rows)
    }
}
