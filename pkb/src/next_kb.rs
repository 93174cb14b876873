use crate::relation_table::RelationTable;
use crate::relationship::StmtNo;
use std::collections::HashSet;

/// Control flow graph edges, both within procedures (`Next`) and across
/// call boundaries (`NextBip`).
#[derive(Debug, Default)]
pub struct NextKb {
    next: RelationTable,
    next_bip: RelationTable,
}

impl NextKb {
    pub fn add_next(&mut self, from: StmtNo, to: StmtNo) {
        self.next.insert(from, to);
    }

    pub fn add_next_bip(&mut self, from: StmtNo, to: StmtNo) {
        self.next_bip.insert(from, to);
    }

    pub fn is_next(&self, from: StmtNo, to: StmtNo) -> bool {
        self.next.contains(from, to)
    }

    pub fn next_statements(&self, from: StmtNo) -> &HashSet<StmtNo> {
        self.next.rights_of(from)
    }

    pub fn previous_statements(&self, to: StmtNo) -> &HashSet<StmtNo> {
        self.next.lefts_of(to)
    }

    pub fn next_bip_statements(&self, from: StmtNo) -> &HashSet<StmtNo> {
        self.next_bip.rights_of(from)
    }

    pub fn previous_bip_statements(&self, to: StmtNo) -> &HashSet<StmtNo> {
        self.next_bip.lefts_of(to)
    }

    pub(crate) fn next(&self) -> &RelationTable {
        &self.next
    }

    pub(crate) fn next_bip(&self) -> &RelationTable {
        &self.next_bip
    }
}
