use std::fmt::{Display, Formatter};

pub type StmtNo = u32;
pub type TableIndex = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipType {
    Follows,
    FollowsT,
    Parent,
    ParentT,
    UsesS,
    UsesP,
    ModifiesS,
    ModifiesP,
    Calls,
    CallsT,
    Next,
    NextBip,
    NextT,
    NextBipT,
    Affects,
    AffectsT,
}

/// What the values on one side of a relationship index into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Statement,
    Table(TableType),
}

impl RelationshipType {
    /// Relationships whose facts are computed at query time rather than stored.
    pub fn is_on_demand(self) -> bool {
        matches!(
            self,
            RelationshipType::NextT
                | RelationshipType::NextBipT
                | RelationshipType::Affects
                | RelationshipType::AffectsT
        )
    }

    pub fn left_side(self) -> Side {
        match self {
            RelationshipType::UsesP
            | RelationshipType::ModifiesP
            | RelationshipType::Calls
            | RelationshipType::CallsT => Side::Table(TableType::Procedure),
            _ => Side::Statement,
        }
    }

    pub fn right_side(self) -> Side {
        match self {
            RelationshipType::UsesS
            | RelationshipType::UsesP
            | RelationshipType::ModifiesS
            | RelationshipType::ModifiesP => Side::Table(TableType::Variable),
            RelationshipType::Calls | RelationshipType::CallsT => {
                Side::Table(TableType::Procedure)
            }
            _ => Side::Statement,
        }
    }
}

impl Display for RelationshipType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelationshipType::Follows => "Follows",
            RelationshipType::FollowsT => "Follows*",
            RelationshipType::Parent => "Parent",
            RelationshipType::ParentT => "Parent*",
            RelationshipType::UsesS => "Uses(stmt)",
            RelationshipType::UsesP => "Uses(proc)",
            RelationshipType::ModifiesS => "Modifies(stmt)",
            RelationshipType::ModifiesP => "Modifies(proc)",
            RelationshipType::Calls => "Calls",
            RelationshipType::CallsT => "Calls*",
            RelationshipType::Next => "Next",
            RelationshipType::NextBip => "NextBip",
            RelationshipType::NextT => "Next*",
            RelationshipType::NextBipT => "NextBip*",
            RelationshipType::Affects => "Affects",
            RelationshipType::AffectsT => "Affects*",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamPosition {
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableType {
    Variable,
    Constant,
    Procedure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKind {
    Read,
    Print,
    Call,
    While,
    If,
    Assign,
}
