use crate::query::clause::Clause;
use crate::query::design_entity::{AttributeName, DesignEntity};
use std::collections::HashMap;

pub mod clause;
pub mod design_entity;
pub mod query_argument;
pub mod query_builder;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectElement {
    Synonym(String),
    Attribute(String, AttributeName),
}

impl SelectElement {
    pub fn synonym(&self) -> &str {
        match self {
            SelectElement::Synonym(synonym) | SelectElement::Attribute(synonym, _) => synonym,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectType {
    #[default]
    Boolean,
    Elements(Vec<SelectElement>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectClause {
    pub select: SelectType,
    pub clauses: Vec<Clause>,
}

/// A semantically valid query: every synonym is declared and every clause
/// argument fits its position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub declarations: HashMap<String, DesignEntity>,
    pub select: SelectClause,
}

impl Query {
    pub fn is_boolean(&self) -> bool {
        self.select.select == SelectType::Boolean
    }

    pub fn entity_of(&self, synonym: &str) -> Option<DesignEntity> {
        self.declarations.get(synonym).copied()
    }

    pub fn select_elements(&self) -> &[SelectElement] {
        match &self.select.select {
            SelectType::Boolean => &[],
            SelectType::Elements(elements) => elements,
        }
    }

    /// Distinct selected synonyms in select order.
    pub fn selected_synonyms(&self) -> Vec<&str> {
        let mut synonyms = Vec::new();
        for element in self.select_elements() {
            if !synonyms.contains(&element.synonym()) {
                synonyms.push(element.synonym());
            }
        }
        synonyms
    }
}
