use crate::query::clause::ExpressionSpec;
use pkb::pkb_context::PkbContext;
use pkb::relationship::{StmtNo, TableIndex, TableType};
use std::collections::BTreeSet;

/// Pattern clauses over assignments and container conditions.
///
/// A variable of `None` matches any variable; a name that is not in the
/// variable table matches nothing.
pub struct PatternEvaluator<'a> {
    pkb: &'a PkbContext,
}

impl<'a> PatternEvaluator<'a> {
    pub fn new(pkb: &'a PkbContext) -> Self {
        Self { pkb }
    }

    fn assigns_matching(&self, expression: &ExpressionSpec) -> BTreeSet<StmtNo> {
        let patterns = self.pkb.patterns();
        match expression {
            ExpressionSpec::Any => self.pkb.assigns().clone(),
            ExpressionSpec::Exact(expression) => patterns
                .assigns_for_full_expression(expression)
                .iter()
                .copied()
                .collect(),
            ExpressionSpec::SubExpression(expression) => patterns
                .assigns_for_sub_expression(expression)
                .iter()
                .copied()
                .collect(),
        }
    }

    fn variable_index(&self, variable: &str) -> Option<TableIndex> {
        self.pkb.index_of(TableType::Variable, variable)
    }

    pub fn evaluate_assign_pattern(&self, variable: Option<&str>, expression: &ExpressionSpec) -> BTreeSet<StmtNo> {
        let candidates = self.assigns_matching(expression);
        let Some(variable) = variable else {
            return candidates;
        };
        let Some(variable) = self.variable_index(variable) else {
            return BTreeSet::new();
        };

        candidates
            .into_iter()
            .filter(|&statement| self.pkb.patterns().assigned_variable(statement) == Some(variable))
            .collect()
    }

    pub fn evaluate_assign_pair_pattern(&self, expression: &ExpressionSpec) -> Vec<(StmtNo, TableIndex)> {
        self.assigns_matching(expression)
            .into_iter()
            .filter_map(|statement| {
                let variable = self.pkb.patterns().assigned_variable(statement)?;
                Some((statement, variable))
            })
            .collect()
    }

    pub fn evaluate_if_pattern(&self, variable: Option<&str>) -> BTreeSet<StmtNo> {
        match variable {
            Some(variable) => match self.variable_index(variable) {
                Some(variable) => self.pkb.patterns().ifs_for_variable(variable).iter().copied().collect(),
                None => BTreeSet::new(),
            },
            None => self.pkb.patterns().if_variable_pairs().map(|(statement, _)| statement).collect(),
        }
    }

    pub fn evaluate_if_pair_pattern(&self) -> Vec<(StmtNo, TableIndex)> {
        let mut pairs = self.pkb.patterns().if_variable_pairs().collect::<Vec<_>>();
        pairs.sort_unstable();
        pairs
    }

    pub fn evaluate_while_pattern(&self, variable: Option<&str>) -> BTreeSet<StmtNo> {
        match variable {
            Some(variable) => match self.variable_index(variable) {
                Some(variable) => self.pkb.patterns().whiles_for_variable(variable).iter().copied().collect(),
                None => BTreeSet::new(),
            },
            None => self.pkb.patterns().while_variable_pairs().map(|(statement, _)| statement).collect(),
        }
    }

    pub fn evaluate_while_pair_pattern(&self) -> Vec<(StmtNo, TableIndex)> {
        let mut pairs = self.pkb.patterns().while_variable_pairs().collect::<Vec<_>>();
        pairs.sort_unstable();
        pairs
    }
}
