use crate::query::design_entity::{AttributeName, DesignEntity};
use pkb::relationship::RelationshipType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    Synonym(String),
    Integer(u32),
    Name(String),
    Wildcard,
    Attribute {
        synonym: String,
        attribute: AttributeName,
    },
}

impl Param {
    pub fn synonym(&self) -> Option<&str> {
        match self {
            Param::Synonym(synonym) | Param::Attribute { synonym, .. } => Some(synonym),
            _ => None,
        }
    }
}

/// Right hand side of an assign pattern, already in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpressionSpec {
    Any,
    Exact(String),
    SubExpression(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Clause {
    SuchThat {
        relationship: RelationshipType,
        left: Param,
        right: Param,
    },
    Pattern {
        synonym: String,
        entity: DesignEntity,
        variable: Param,
        expression: ExpressionSpec,
    },
    With {
        left: Param,
        right: Param,
    },
}

impl Clause {
    /// Distinct synonyms the clause constrains, in argument order.
    pub fn synonyms(&self) -> Vec<&str> {
        let candidates = match self {
            Clause::SuchThat { left, right, .. } | Clause::With { left, right } => {
                [left.synonym(), right.synonym()]
            }
            Clause::Pattern {
                synonym, variable, ..
            } => [Some(synonym.as_str()), variable.synonym()],
        };

        let mut synonyms = Vec::with_capacity(2);
        for synonym in candidates.into_iter().flatten() {
            if !synonyms.contains(&synonym) {
                synonyms.push(synonym);
            }
        }
        synonyms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_synonyms() {
        let clause = Clause::SuchThat {
            relationship: RelationshipType::NextT,
            left: Param::Synonym("s".to_string()),
            right: Param::Synonym("s".to_string()),
        };
        assert_eq!(clause.synonyms(), vec!["s"]);

        let clause = Clause::Pattern {
            synonym: "a".to_string(),
            entity: DesignEntity::Assign,
            variable: Param::Synonym("v".to_string()),
            expression: ExpressionSpec::Any,
        };
        assert_eq!(clause.synonyms(), vec!["a", "v"]);

        let clause = Clause::With {
            left: Param::Attribute {
                synonym: "c".to_string(),
                attribute: AttributeName::Value,
            },
            right: Param::Integer(1),
        };
        assert_eq!(clause.synonyms(), vec!["c"]);
    }
}
