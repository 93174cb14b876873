use crate::affects_info_kb::AffectsInfoKb;
use crate::calls_kb::CallsKb;
use crate::next_kb::NextKb;
use crate::pattern_kb::PatternKb;
use crate::relation_table::RelationTable;
use crate::relationship::{ParamPosition, RelationshipType, StatementKind, StmtNo, TableIndex, TableType};
use crate::table::Table;
use std::collections::{BTreeSet, HashMap, HashSet};

/// One side of a relationship fact addressed by statement number or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Statement(StmtNo),
    Named(TableType, &'a str),
}

/// The program knowledge base. Populated once by the design extractor and
/// read-only afterwards.
#[derive(Default, Debug)]
pub struct PkbContext {
    relations: HashMap<RelationshipType, RelationTable>,
    statements: BTreeSet<StmtNo>,
    statements_by_kind: HashMap<StatementKind, BTreeSet<StmtNo>>,
    variables: Table,
    constants: Table,
    procedures: Table,
    pub(crate) calls: CallsKb,
    pub(crate) next: NextKb,
    pub(crate) patterns: PatternKb,
    pub(crate) affects_info: AffectsInfoKb,
    empty: HashSet<u32>,
    empty_mappings: HashSet<Vec<u32>>,
    empty_statements: BTreeSet<StmtNo>,
}

// relationships
impl PkbContext {
    /// Records a direct fact. Panics for relationships computed on demand.
    pub fn add_rs(&mut self, rs: RelationshipType, left: u32, right: u32) {
        match rs {
            RelationshipType::NextT
            | RelationshipType::NextBipT
            | RelationshipType::Affects
            | RelationshipType::AffectsT => {
                panic!("{} is computed on demand and cannot be stored", rs)
            }
            RelationshipType::Calls => {
                panic!("Calls facts need their call statement, use add_calls")
            }
            RelationshipType::CallsT => self.calls.add_calls_t(left, right),
            RelationshipType::Next => self.next.add_next(left, right),
            RelationshipType::NextBip => self.next.add_next_bip(left, right),
            _ => self.relations.entry(rs).or_default().insert(left, right),
        }
    }

    pub fn add_calls(&mut self, statement: StmtNo, caller: &str, callee: &str) {
        let caller = self.procedures.insert(caller);
        let callee = self.procedures.insert(callee);
        self.calls.add_calls(statement, caller, callee);
    }

    pub fn is_rs(&self, rs: RelationshipType, left: u32, right: u32) -> bool {
        self.relation(rs)
            .is_some_and(|table| table.contains(left, right))
    }

    pub fn get_right(&self, rs: RelationshipType, left: u32) -> &HashSet<u32> {
        self.relation(rs)
            .map_or(&self.empty, |table| table.rights_of(left))
    }

    pub fn get_left(&self, rs: RelationshipType, right: u32) -> &HashSet<u32> {
        self.relation(rs)
            .map_or(&self.empty, |table| table.lefts_of(right))
    }

    pub fn get_mappings(&self, rs: RelationshipType, position: ParamPosition) -> &HashSet<Vec<u32>> {
        self.relation(rs)
            .map_or(&self.empty_mappings, |table| table.mappings(position))
    }

    pub fn add_rs_named(&mut self, rs: RelationshipType, left: Entity, right: Entity) {
        let left = self.insert_entity(left);
        let right = self.insert_entity(right);
        self.add_rs(rs, left, right);
    }

    pub fn is_rs_named(&self, rs: RelationshipType, left: Entity, right: Entity) -> bool {
        match (self.entity_index(left), self.entity_index(right)) {
            (Some(left), Some(right)) => self.is_rs(rs, left, right),
            _ => false,
        }
    }

    pub fn get_right_named(&self, rs: RelationshipType, left: Entity) -> &HashSet<u32> {
        match self.entity_index(left) {
            Some(left) => self.get_right(rs, left),
            None => &self.empty,
        }
    }

    pub fn get_left_named(&self, rs: RelationshipType, right: Entity) -> &HashSet<u32> {
        match self.entity_index(right) {
            Some(right) => self.get_left(rs, right),
            None => &self.empty,
        }
    }

    fn relation(&self, rs: RelationshipType) -> Option<&RelationTable> {
        match rs {
            RelationshipType::Calls => Some(self.calls.calls()),
            RelationshipType::CallsT => Some(self.calls.calls_t()),
            RelationshipType::Next => Some(self.next.next()),
            RelationshipType::NextBip => Some(self.next.next_bip()),
            _ => self.relations.get(&rs),
        }
    }

    fn insert_entity(&mut self, entity: Entity) -> u32 {
        match entity {
            Entity::Statement(statement) => statement,
            Entity::Named(table, name) => self.insert_at(table, name),
        }
    }

    fn entity_index(&self, entity: Entity) -> Option<u32> {
        match entity {
            Entity::Statement(statement) => Some(statement),
            Entity::Named(table, name) => self.index_of(table, name),
        }
    }
}

macro_rules! statements_for {
    ($name:ident, $kind:path) => {
        pub fn $name(&self) -> &BTreeSet<StmtNo> {
            self.statements_of($kind)
        }
    };
}

// statements
impl PkbContext {
    pub fn add_statement(&mut self, statement: StmtNo, kind: StatementKind) {
        self.statements.insert(statement);
        self.statements_by_kind
            .entry(kind)
            .or_default()
            .insert(statement);
    }

    pub fn statements(&self) -> &BTreeSet<StmtNo> {
        &self.statements
    }

    pub fn statements_of(&self, kind: StatementKind) -> &BTreeSet<StmtNo> {
        self.statements_by_kind
            .get(&kind)
            .unwrap_or(&self.empty_statements)
    }

    pub fn is_statement_of(&self, kind: StatementKind, statement: StmtNo) -> bool {
        self.statements_of(kind).contains(&statement)
    }

    pub fn kind_of(&self, statement: StmtNo) -> Option<StatementKind> {
        self.statements_by_kind
            .iter()
            .find(|(_, statements)| statements.contains(&statement))
            .map(|(kind, _)| *kind)
    }

    statements_for!(reads, StatementKind::Read);
    statements_for!(prints, StatementKind::Print);
    statements_for!(call_statements, StatementKind::Call);
    statements_for!(whiles, StatementKind::While);
    statements_for!(ifs, StatementKind::If);
    statements_for!(assigns, StatementKind::Assign);
}

// tables
impl PkbContext {
    pub fn insert_at(&mut self, table: TableType, element: &str) -> TableIndex {
        self.table_mut(table).insert(element)
    }

    pub fn index_of(&self, table: TableType, element: &str) -> Option<TableIndex> {
        self.table(table).index_of(element)
    }

    pub fn element_at(&self, table: TableType, index: TableIndex) -> Option<&str> {
        self.table(table).element_at(index)
    }

    pub fn all_elements_at(&self, table: TableType) -> BTreeSet<TableIndex> {
        self.table(table).all_indices()
    }

    pub fn table(&self, table: TableType) -> &Table {
        match table {
            TableType::Variable => &self.variables,
            TableType::Constant => &self.constants,
            TableType::Procedure => &self.procedures,
        }
    }

    fn table_mut(&mut self, table: TableType) -> &mut Table {
        match table {
            TableType::Variable => &mut self.variables,
            TableType::Constant => &mut self.constants,
            TableType::Procedure => &mut self.procedures,
        }
    }
}

// relation stores
impl PkbContext {
    pub fn is_calls(&self, caller: &str, callee: &str) -> bool {
        self.is_rs_named(
            RelationshipType::Calls,
            Entity::Named(TableType::Procedure, caller),
            Entity::Named(TableType::Procedure, callee),
        )
    }

    pub fn is_calls_t(&self, caller: &str, callee: &str) -> bool {
        self.is_rs_named(
            RelationshipType::CallsT,
            Entity::Named(TableType::Procedure, caller),
            Entity::Named(TableType::Procedure, callee),
        )
    }

    pub fn calls(&self) -> &CallsKb {
        &self.calls
    }

    pub fn next(&self) -> &NextKb {
        &self.next
    }

    pub fn patterns(&self) -> &PatternKb {
        &self.patterns
    }

    pub fn affects_info(&self) -> &AffectsInfoKb {
        &self.affects_info
    }

    /// Variable a statement writes directly: the target of an assignment or
    /// a read.
    pub fn written_variable(&self, statement: StmtNo) -> Option<TableIndex> {
        match self.kind_of(statement)? {
            StatementKind::Assign | StatementKind::Read => self
                .get_right(RelationshipType::ModifiesS, statement)
                .iter()
                .next()
                .copied(),
            _ => None,
        }
    }
}
