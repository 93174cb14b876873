use crate::evaluator::domain;
use crate::evaluator::result_table::{ClauseResult, ResultTable};
use crate::query::clause::Param;
use crate::query::design_entity::{AttributeName, DesignEntity};
use crate::query::Query;
use pkb::pkb_context::PkbContext;
use pkb::relationship::{RelationshipType, TableType};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

/// Value of an attribute reference or literal in a with clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrValue {
    Name(String),
    Integer(u32),
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Name(name) => write!(f, "{}", name),
            AttrValue::Integer(value) => write!(f, "{}", value),
        }
    }
}

enum WithSide<'p> {
    Literal(AttrValue),
    Reference {
        synonym: &'p str,
        entity: DesignEntity,
        attribute: Option<AttributeName>,
    },
}

pub struct WithEvaluator<'a> {
    pkb: &'a PkbContext,
}

impl<'a> WithEvaluator<'a> {
    pub fn new(pkb: &'a PkbContext) -> Self {
        Self { pkb }
    }

    /// Attribute of the entity a synonym value stands for. Without an
    /// attribute the value is taken as a statement number (`prog_line`).
    pub fn attribute_value(
        &self,
        entity: DesignEntity,
        attribute: Option<AttributeName>,
        value: u32,
    ) -> Option<AttrValue> {
        let name = |table: TableType, index: u32| {
            self.pkb
                .element_at(table, index)
                .map(|name| AttrValue::Name(name.to_string()))
        };

        match (attribute, entity) {
            (None | Some(AttributeName::StmtNo), _) => Some(AttrValue::Integer(value)),
            (Some(AttributeName::ProcName), DesignEntity::Procedure) => name(TableType::Procedure, value),
            (Some(AttributeName::ProcName), DesignEntity::Call) => {
                name(TableType::Procedure, self.pkb.calls().callee_of(value)?)
            }
            (Some(AttributeName::VarName), DesignEntity::Variable) => name(TableType::Variable, value),
            (Some(AttributeName::VarName), DesignEntity::Read) => {
                name(TableType::Variable, self.pkb.written_variable(value)?)
            }
            (Some(AttributeName::VarName), DesignEntity::Print) => {
                let variable = self
                    .pkb
                    .get_right(RelationshipType::UsesS, value)
                    .iter()
                    .next()
                    .copied()?;
                name(TableType::Variable, variable)
            }
            (Some(AttributeName::Value), DesignEntity::Constant) => self
                .pkb
                .element_at(TableType::Constant, value)?
                .parse()
                .ok()
                .map(AttrValue::Integer),
            (Some(attribute), entity) => {
                panic!("{} has no attribute {:?}", entity, attribute)
            }
        }
    }

    fn side<'p>(&self, query: &Query, param: &'p Param) -> WithSide<'p> {
        let reference = |synonym: &'p str, attribute| {
            let entity = query
                .entity_of(synonym)
                .unwrap_or_else(|| panic!("with clause references undeclared synonym {}", synonym));
            WithSide::Reference {
                synonym,
                entity,
                attribute,
            }
        };

        match param {
            Param::Integer(value) => WithSide::Literal(AttrValue::Integer(*value)),
            Param::Name(name) => WithSide::Literal(AttrValue::Name(name.clone())),
            Param::Synonym(synonym) => reference(synonym, None),
            Param::Attribute {
                synonym,
                attribute,
            } => reference(synonym, Some(*attribute)),
            Param::Wildcard => panic!("with clauses cannot compare wildcards"),
        }
    }

    fn candidates(&self, synonym: &str, entity: DesignEntity, table: &ResultTable) -> BTreeSet<u32> {
        if table.is_bound(synonym) {
            table.values_of(synonym)
        } else {
            domain(self.pkb, entity)
        }
    }

    fn values_of(
        &self,
        synonym: &str,
        entity: DesignEntity,
        attribute: Option<AttributeName>,
        table: &ResultTable,
    ) -> Vec<(u32, AttrValue)> {
        self.candidates(synonym, entity, table)
            .into_iter()
            .filter_map(|value| Some((value, self.attribute_value(entity, attribute, value)?)))
            .collect()
    }

    pub fn evaluate(&self, query: &Query, left: &Param, right: &Param, table: &ResultTable) -> ClauseResult {
        match (self.side(query, left), self.side(query, right)) {
            (WithSide::Literal(left), WithSide::Literal(right)) => ClauseResult::Boolean(left == right),
            (
                WithSide::Reference {
                    synonym,
                    entity,
                    attribute,
                },
                WithSide::Literal(literal),
            )
            | (
                WithSide::Literal(literal),
                WithSide::Reference {
                    synonym,
                    entity,
                    attribute,
                },
            ) => ClauseResult::Column {
                synonym: synonym.to_string(),
                values: self
                    .values_of(synonym, entity, attribute, table)
                    .into_iter()
                    .filter(|(_, value)| *value == literal)
                    .map(|(synonym_value, _)| synonym_value)
                    .collect(),
            },
            (
                WithSide::Reference {
                    synonym: left,
                    entity: left_entity,
                    attribute: left_attribute,
                },
                WithSide::Reference {
                    synonym: right,
                    entity: right_entity,
                    attribute: right_attribute,
                },
            ) => {
                let mut by_value: HashMap<AttrValue, Vec<u32>> = HashMap::new();
                for (value, attribute) in self.values_of(right, right_entity, right_attribute, table) {
                    by_value.entry(attribute).or_default().push(value);
                }

                let pairs = self
                    .values_of(left, left_entity, left_attribute, table)
                    .into_iter()
                    .flat_map(|(value, attribute)| {
                        by_value
                            .get(&attribute)
                            .into_iter()
                            .flatten()
                            .map(move |&other| (value, other))
                    })
                    .collect::<Vec<_>>();

                ClauseResult::pairs(left, right, pairs)
            }
        }
    }
}
