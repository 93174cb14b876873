use pkb::relationship::{StatementKind, TableType};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesignEntity {
    Stmt,
    Read,
    Print,
    Call,
    While,
    If,
    Assign,
    Variable,
    Constant,
    Procedure,
    ProgLine,
}

impl DesignEntity {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let entity = match keyword {
            "stmt" => DesignEntity::Stmt,
            "read" => DesignEntity::Read,
            "print" => DesignEntity::Print,
            "call" => DesignEntity::Call,
            "while" => DesignEntity::While,
            "if" => DesignEntity::If,
            "assign" => DesignEntity::Assign,
            "variable" => DesignEntity::Variable,
            "constant" => DesignEntity::Constant,
            "procedure" => DesignEntity::Procedure,
            "prog_line" => DesignEntity::ProgLine,
            _ => return None,
        };

        Some(entity)
    }

    pub fn is_statement(self) -> bool {
        !matches!(
            self,
            DesignEntity::Variable | DesignEntity::Constant | DesignEntity::Procedure
        )
    }

    /// Statement kind this entity is restricted to, `None` for generic
    /// statements and for non-statement entities.
    pub fn statement_kind(self) -> Option<StatementKind> {
        match self {
            DesignEntity::Read => Some(StatementKind::Read),
            DesignEntity::Print => Some(StatementKind::Print),
            DesignEntity::Call => Some(StatementKind::Call),
            DesignEntity::While => Some(StatementKind::While),
            DesignEntity::If => Some(StatementKind::If),
            DesignEntity::Assign => Some(StatementKind::Assign),
            _ => None,
        }
    }

    pub fn table(self) -> Option<TableType> {
        match self {
            DesignEntity::Variable => Some(TableType::Variable),
            DesignEntity::Constant => Some(TableType::Constant),
            DesignEntity::Procedure => Some(TableType::Procedure),
            _ => None,
        }
    }

    pub fn supports(self, attribute: AttributeName) -> bool {
        match attribute {
            AttributeName::ProcName => matches!(self, DesignEntity::Procedure | DesignEntity::Call),
            AttributeName::VarName => matches!(
                self,
                DesignEntity::Variable | DesignEntity::Read | DesignEntity::Print
            ),
            AttributeName::Value => self == DesignEntity::Constant,
            AttributeName::StmtNo => self.is_statement() && self != DesignEntity::ProgLine,
        }
    }
}

impl Display for DesignEntity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let keyword = match self {
            DesignEntity::Stmt => "stmt",
            DesignEntity::Read => "read",
            DesignEntity::Print => "print",
            DesignEntity::Call => "call",
            DesignEntity::While => "while",
            DesignEntity::If => "if",
            DesignEntity::Assign => "assign",
            DesignEntity::Variable => "variable",
            DesignEntity::Constant => "constant",
            DesignEntity::Procedure => "procedure",
            DesignEntity::ProgLine => "prog_line",
        };
        write!(f, "{}", keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeName {
    ProcName,
    VarName,
    Value,
    StmtNo,
}

impl AttributeName {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "procName" => Some(AttributeName::ProcName),
            "varName" => Some(AttributeName::VarName),
            "value" => Some(AttributeName::Value),
            "stmt#" => Some(AttributeName::StmtNo),
            _ => None,
        }
    }

    /// Whether the attribute compares as a name rather than an integer.
    pub fn is_name(self) -> bool {
        matches!(self, AttributeName::ProcName | AttributeName::VarName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::call_proc_name(DesignEntity::Call, AttributeName::ProcName, true)]
    #[case::read_var_name(DesignEntity::Read, AttributeName::VarName, true)]
    #[case::assign_var_name(DesignEntity::Assign, AttributeName::VarName, false)]
    #[case::constant_value(DesignEntity::Constant, AttributeName::Value, true)]
    #[case::while_stmt_no(DesignEntity::While, AttributeName::StmtNo, true)]
    #[case::variable_stmt_no(DesignEntity::Variable, AttributeName::StmtNo, false)]
    #[case::prog_line_stmt_no(DesignEntity::ProgLine, AttributeName::StmtNo, false)]
    fn test_supported_attributes(
        #[case] entity: DesignEntity,
        #[case] attribute: AttributeName,
        #[case] expected: bool,
    ) {
        assert_eq!(entity.supports(attribute), expected);
    }
}
