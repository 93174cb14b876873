use crate::query::clause::{Clause, ExpressionSpec, Param};
use crate::query::design_entity::{AttributeName, DesignEntity};
use crate::query::query_argument::{Argument, ExpressionArgument};
use crate::query::{Query, SelectClause, SelectElement, SelectType};
use pkb::relationship::{RelationshipType, Side, TableType};
use simple::canonical::canonical_form;
use simple::simple_parser::SimpleParser;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Default, Clone, PartialEq)]
pub enum ResultType {
    Tuple(Vec<Argument>),
    #[default]
    Boolean,
}

#[derive(Debug, PartialEq, Error)]
pub enum QueryError {
    #[error("Unknown design entity: {0}")]
    UnknownDesignEntity(String),
    #[error("Synonym {0} is declared more than once")]
    DuplicateDeclaration(String),
    #[error("Synonym {0} is not declared")]
    UndeclaredSynonym(String),
    #[error("Unknown relationship: {0}")]
    UnknownRelationship(String),
    #[error("Invalid argument {argument:?} for {context}")]
    InvalidArgument { context: String, argument: Argument },
    #[error("Synonym {0} cannot be used in a pattern clause")]
    InvalidPatternSynonym(String),
    #[error("Invalid attribute {attribute} for synonym {synonym}")]
    InvalidAttribute { synonym: String, attribute: String },
    #[error("With clause compares a name with an integer")]
    IncompatibleWith,
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
}

/// Collects the pieces of a query as they are parsed and checks them
/// against the declarations on `build`.
#[cfg_attr(test, mockall::automock)]
pub trait QueryBuilder {
    fn add_declaration(&mut self, declaration: (String, Vec<String>));
    fn set_result(&mut self, result: ResultType);
    fn add_relationship(&mut self, relationship: String, left: Argument, right: Argument);
    fn add_pattern(
        &mut self,
        synonym: String,
        variable: Argument,
        expression: ExpressionArgument,
        argument_count: usize,
    );
    fn add_with(&mut self, left: Argument, right: Argument);
    /// Builds the collected query and resets the builder.
    fn build(&mut self) -> Result<Query, QueryError>;
}

enum RawClause {
    Relationship(String, Argument, Argument),
    Pattern(String, Argument, ExpressionArgument, usize),
    With(Argument, Argument),
}

#[derive(Default)]
pub struct PqlQueryBuilder {
    declarations: Vec<(String, Vec<String>)>,
    result_type: ResultType,
    clauses: Vec<RawClause>,
}

impl QueryBuilder for PqlQueryBuilder {
    fn add_declaration(&mut self, declaration: (String, Vec<String>)) {
        self.declarations.push(declaration);
    }

    fn set_result(&mut self, result: ResultType) {
        self.result_type = result;
    }

    fn add_relationship(&mut self, relationship: String, left: Argument, right: Argument) {
        self.clauses
            .push(RawClause::Relationship(relationship, left, right));
    }

    fn add_pattern(
        &mut self,
        synonym: String,
        variable: Argument,
        expression: ExpressionArgument,
        argument_count: usize,
    ) {
        self.clauses.push(RawClause::Pattern(
            synonym,
            variable,
            expression,
            argument_count,
        ));
    }

    fn add_with(&mut self, left: Argument, right: Argument) {
        self.clauses.push(RawClause::With(left, right));
    }

    fn build(&mut self) -> Result<Query, QueryError> {
        let builder = std::mem::take(self);

        let mut declarations = HashMap::new();
        for (keyword, names) in builder.declarations {
            let entity = DesignEntity::from_keyword(&keyword)
                .ok_or(QueryError::UnknownDesignEntity(keyword))?;
            for name in names {
                if declarations.insert(name.clone(), entity).is_some() {
                    return Err(QueryError::DuplicateDeclaration(name));
                }
            }
        }

        let checker = Checker {
            declarations: &declarations,
        };
        let select = checker.select(builder.result_type)?;
        let clauses = builder
            .clauses
            .into_iter()
            .map(|clause| checker.clause(clause))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Query {
            declarations,
            select: SelectClause { select, clauses },
        })
    }
}

struct Checker<'d> {
    declarations: &'d HashMap<String, DesignEntity>,
}

impl Checker<'_> {
    fn entity_of(&self, synonym: &str) -> Result<DesignEntity, QueryError> {
        self.declarations
            .get(synonym)
            .copied()
            .ok_or_else(|| QueryError::UndeclaredSynonym(synonym.to_string()))
    }

    fn attribute(&self, synonym: &str, attribute: &str) -> Result<AttributeName, QueryError> {
        let entity = self.entity_of(synonym)?;
        AttributeName::from_name(attribute)
            .filter(|name| entity.supports(*name))
            .ok_or_else(|| QueryError::InvalidAttribute {
                synonym: synonym.to_string(),
                attribute: attribute.to_string(),
            })
    }

    fn select(&self, result: ResultType) -> Result<SelectType, QueryError> {
        let arguments = match result {
            ResultType::Boolean if self.declarations.contains_key("BOOLEAN") => {
                vec![Argument::Synonym("BOOLEAN".to_string())]
            }
            ResultType::Boolean => return Ok(SelectType::Boolean),
            ResultType::Tuple(arguments) => arguments,
        };

        let elements = arguments
            .into_iter()
            .map(|argument| match argument {
                Argument::Synonym(synonym) => {
                    self.entity_of(&synonym)?;
                    Ok(SelectElement::Synonym(synonym))
                }
                Argument::Attribute(synonym, attribute) => {
                    let attribute = self.attribute(&synonym, &attribute)?;
                    Ok(SelectElement::Attribute(synonym, attribute))
                }
                argument => Err(QueryError::InvalidArgument {
                    context: "Select".to_string(),
                    argument,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SelectType::Elements(elements))
    }

    fn clause(&self, clause: RawClause) -> Result<Clause, QueryError> {
        match clause {
            RawClause::Relationship(name, left, right) => self.relationship(&name, left, right),
            RawClause::Pattern(synonym, variable, expression, count) => {
                self.pattern(synonym, variable, expression, count)
            }
            RawClause::With(left, right) => self.with(left, right),
        }
    }

    fn relationship(&self, name: &str, left: Argument, right: Argument) -> Result<Clause, QueryError> {
        let relationship = match name {
            "Follows" => RelationshipType::Follows,
            "Follows*" => RelationshipType::FollowsT,
            "Parent" => RelationshipType::Parent,
            "Parent*" => RelationshipType::ParentT,
            "Calls" => RelationshipType::Calls,
            "Calls*" => RelationshipType::CallsT,
            "Next" => RelationshipType::Next,
            "Next*" => RelationshipType::NextT,
            "NextBip" => RelationshipType::NextBip,
            "NextBip*" => RelationshipType::NextBipT,
            "Affects" => RelationshipType::Affects,
            "Affects*" => RelationshipType::AffectsT,
            "Uses" | "Modifies" => {
                let procedure_level = match &left {
                    Argument::Quoted(_) => true,
                    Argument::Synonym(synonym) => self.entity_of(synonym)? == DesignEntity::Procedure,
                    Argument::Number(_) => false,
                    argument => {
                        return Err(QueryError::InvalidArgument {
                            context: name.to_string(),
                            argument: argument.clone(),
                        })
                    }
                };
                match (name, procedure_level) {
                    ("Uses", true) => RelationshipType::UsesP,
                    ("Uses", false) => RelationshipType::UsesS,
                    (_, true) => RelationshipType::ModifiesP,
                    (_, false) => RelationshipType::ModifiesS,
                }
            }
            _ => return Err(QueryError::UnknownRelationship(name.to_string())),
        };

        Ok(Clause::SuchThat {
            relationship,
            left: self.relationship_param(relationship, relationship.left_side(), left)?,
            right: self.relationship_param(relationship, relationship.right_side(), right)?,
        })
    }

    fn relationship_param(
        &self,
        relationship: RelationshipType,
        side: Side,
        argument: Argument,
    ) -> Result<Param, QueryError> {
        let param = match (&argument, side) {
            (Argument::Any, _) => Some(Param::Wildcard),
            (Argument::Number(number), Side::Statement) => Some(Param::Integer(*number)),
            (Argument::Quoted(name), Side::Table(_)) if is_name(name) => Some(Param::Name(name.clone())),
            (Argument::Synonym(synonym), Side::Statement) => self
                .entity_of(synonym)?
                .is_statement()
                .then(|| Param::Synonym(synonym.clone())),
            (Argument::Synonym(synonym), Side::Table(table)) => (self.entity_of(synonym)?.table()
                == Some(table))
            .then(|| Param::Synonym(synonym.clone())),
            _ => None,
        };

        param.ok_or_else(|| QueryError::InvalidArgument {
            context: relationship.to_string(),
            argument,
        })
    }

    fn pattern(
        &self,
        synonym: String,
        variable: Argument,
        expression: ExpressionArgument,
        argument_count: usize,
    ) -> Result<Clause, QueryError> {
        let entity = self.entity_of(&synonym)?;
        let expected_count = match entity {
            DesignEntity::If => 3,
            DesignEntity::Assign | DesignEntity::While => 2,
            _ => return Err(QueryError::InvalidPatternSynonym(synonym)),
        };
        if argument_count != expected_count {
            return Err(QueryError::InvalidPatternSynonym(synonym));
        }

        let variable = self.relationship_param(
            RelationshipType::ModifiesS,
            Side::Table(TableType::Variable),
            variable,
        )?;

        let expression = match (entity, expression) {
            (_, ExpressionArgument::Any) => ExpressionSpec::Any,
            (DesignEntity::Assign, ExpressionArgument::Exact(text)) => {
                ExpressionSpec::Exact(canonical(&text)?)
            }
            (DesignEntity::Assign, ExpressionArgument::SubExpression(text)) => {
                ExpressionSpec::SubExpression(canonical(&text)?)
            }
            _ => return Err(QueryError::InvalidPatternSynonym(synonym)),
        };

        Ok(Clause::Pattern {
            synonym,
            entity,
            variable,
            expression,
        })
    }

    fn with(&self, left: Argument, right: Argument) -> Result<Clause, QueryError> {
        let (left, left_is_name) = self.with_param(left)?;
        let (right, right_is_name) = self.with_param(right)?;

        if left_is_name != right_is_name {
            return Err(QueryError::IncompatibleWith);
        }

        Ok(Clause::With { left, right })
    }

    /// The param and whether it compares as a name.
    fn with_param(&self, argument: Argument) -> Result<(Param, bool), QueryError> {
        match argument {
            Argument::Quoted(name) if is_name(&name) => Ok((Param::Name(name), true)),
            Argument::Number(number) => Ok((Param::Integer(number), false)),
            Argument::Attribute(synonym, attribute) => {
                let attribute = self.attribute(&synonym, &attribute)?;
                Ok((Param::Attribute { synonym, attribute }, attribute.is_name()))
            }
            Argument::Synonym(synonym) if self.entity_of(&synonym)? == DesignEntity::ProgLine => {
                Ok((Param::Synonym(synonym), false))
            }
            argument => Err(QueryError::InvalidArgument {
                context: "with".to_string(),
                argument,
            }),
        }
    }
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|ch| ch.is_ascii_alphabetic()) && chars.all(|ch| ch.is_ascii_alphanumeric())
}

fn canonical(text: &str) -> Result<String, QueryError> {
    SimpleParser::default()
        .parse_expression(text)
        .ok()
        .and_then(|expression| canonical_form(&expression))
        .ok_or_else(|| QueryError::InvalidExpression(text.to_string()))
}
