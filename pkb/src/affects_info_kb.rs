use crate::relationship::{StmtNo, TableIndex};
use std::collections::{BTreeMap, HashMap};

/// Procedure level facts the Affects dataflow starts from.
#[derive(Debug, Default)]
pub struct AffectsInfoKb {
    first_statements: BTreeMap<TableIndex, StmtNo>,
    procedure_of: HashMap<StmtNo, TableIndex>,
}

impl AffectsInfoKb {
    pub fn add_first_statement(&mut self, procedure: TableIndex, statement: StmtNo) {
        self.first_statements.insert(procedure, statement);
    }

    pub fn add_statement_of(&mut self, statement: StmtNo, procedure: TableIndex) {
        self.procedure_of.insert(statement, procedure);
    }

    pub fn first_statement_of(&self, procedure: TableIndex) -> Option<StmtNo> {
        self.first_statements.get(&procedure).copied()
    }

    /// First statements of all procedures, in procedure index order.
    pub fn first_statements(&self) -> impl Iterator<Item = StmtNo> + '_ {
        self.first_statements.values().copied()
    }

    pub fn procedure_of(&self, statement: StmtNo) -> Option<TableIndex> {
        self.procedure_of.get(&statement).copied()
    }
}
