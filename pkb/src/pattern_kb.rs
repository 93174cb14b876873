use crate::relation_table::RelationTable;
use crate::relationship::{ParamPosition, StmtNo, TableIndex};
use std::collections::{HashMap, HashSet};

/// Pattern facts. Assignments are indexed by their full canonical right hand
/// side and by every canonical subexpression of it; `if` and `while`
/// statements by the variables of their condition.
#[derive(Debug, Default)]
pub struct PatternKb {
    full_expressions: HashMap<String, HashSet<StmtNo>>,
    sub_expressions: HashMap<String, HashSet<StmtNo>>,
    assign_variables: RelationTable,
    if_variables: RelationTable,
    while_variables: RelationTable,
    empty: HashSet<StmtNo>,
}

impl PatternKb {
    pub fn add_assign_full_expression(&mut self, statement: StmtNo, variable: TableIndex, expression: &str) {
        self.assign_variables.insert(statement, variable);
        self.full_expressions
            .entry(expression.to_string())
            .or_default()
            .insert(statement);
    }

    pub fn add_assign_sub_expression(&mut self, statement: StmtNo, variable: TableIndex, expression: &str) {
        self.assign_variables.insert(statement, variable);
        self.sub_expressions
            .entry(expression.to_string())
            .or_default()
            .insert(statement);
    }

    pub fn add_if_variable(&mut self, statement: StmtNo, variable: TableIndex) {
        self.if_variables.insert(statement, variable);
    }

    pub fn add_while_variable(&mut self, statement: StmtNo, variable: TableIndex) {
        self.while_variables.insert(statement, variable);
    }

    pub fn assigns_for_full_expression(&self, expression: &str) -> &HashSet<StmtNo> {
        self.full_expressions.get(expression).unwrap_or(&self.empty)
    }

    pub fn assigns_for_sub_expression(&self, expression: &str) -> &HashSet<StmtNo> {
        self.sub_expressions.get(expression).unwrap_or(&self.empty)
    }

    pub fn assigns_for_variable(&self, variable: TableIndex) -> &HashSet<StmtNo> {
        self.assign_variables.lefts_of(variable)
    }

    /// Variable on the left hand side of an assignment.
    pub fn assigned_variable(&self, statement: StmtNo) -> Option<TableIndex> {
        self.assign_variables.rights_of(statement).iter().next().copied()
    }

    pub fn ifs_for_variable(&self, variable: TableIndex) -> &HashSet<StmtNo> {
        self.if_variables.lefts_of(variable)
    }

    pub fn whiles_for_variable(&self, variable: TableIndex) -> &HashSet<StmtNo> {
        self.while_variables.lefts_of(variable)
    }

    pub fn if_variable_pairs(&self) -> impl Iterator<Item = (StmtNo, TableIndex)> + '_ {
        pairs_of(&self.if_variables)
    }

    pub fn while_variable_pairs(&self) -> impl Iterator<Item = (StmtNo, TableIndex)> + '_ {
        pairs_of(&self.while_variables)
    }

    pub fn assign_variable_pairs(&self) -> impl Iterator<Item = (StmtNo, TableIndex)> + '_ {
        pairs_of(&self.assign_variables)
    }
}

fn pairs_of(table: &RelationTable) -> impl Iterator<Item = (u32, u32)> + '_ {
    table
        .mappings(ParamPosition::Both)
        .iter()
        .map(|pair| (pair[0], pair[1]))
}
