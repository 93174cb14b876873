use crate::relation_table::RelationTable;
use crate::relationship::{StmtNo, TableIndex};
use std::collections::{BTreeMap, HashSet};

/// Procedure call graph keyed by procedure table indices.
#[derive(Debug, Default)]
pub struct CallsKb {
    calls: RelationTable,
    calls_t: RelationTable,
    callee_of_statement: BTreeMap<StmtNo, TableIndex>,
}

impl CallsKb {
    pub fn add_calls(&mut self, statement: StmtNo, caller: TableIndex, callee: TableIndex) {
        self.callee_of_statement.insert(statement, callee);
        self.calls.insert(caller, callee);
    }

    pub fn add_calls_t(&mut self, caller: TableIndex, callee: TableIndex) {
        self.calls_t.insert(caller, callee);
    }

    pub fn is_calls(&self, caller: TableIndex, callee: TableIndex) -> bool {
        self.calls.contains(caller, callee)
    }

    pub fn is_calls_t(&self, caller: TableIndex, callee: TableIndex) -> bool {
        self.calls_t.contains(caller, callee)
    }

    pub fn procedures_called_by(&self, caller: TableIndex) -> &HashSet<TableIndex> {
        self.calls.rights_of(caller)
    }

    pub fn procedures_called_t_by(&self, caller: TableIndex) -> &HashSet<TableIndex> {
        self.calls_t.rights_of(caller)
    }

    pub fn callers_of(&self, callee: TableIndex) -> &HashSet<TableIndex> {
        self.calls.lefts_of(callee)
    }

    pub fn callers_t_of(&self, callee: TableIndex) -> &HashSet<TableIndex> {
        self.calls_t.lefts_of(callee)
    }

    pub fn callee_of(&self, statement: StmtNo) -> Option<TableIndex> {
        self.callee_of_statement.get(&statement).copied()
    }

    pub fn call_statements(&self) -> impl Iterator<Item = (StmtNo, TableIndex)> + '_ {
        self.callee_of_statement
            .iter()
            .map(|(&statement, &callee)| (statement, callee))
    }

    pub(crate) fn calls(&self) -> &RelationTable {
        &self.calls
    }

    pub(crate) fn calls_t(&self) -> &RelationTable {
        &self.calls_t
    }

    /// Writes the closure of the direct call graph into Calls*.
    pub fn close(&mut self) {
        for (caller, callee) in self.calls.transitive_closure() {
            self.calls_t.insert(caller, callee);
        }
    }
}
