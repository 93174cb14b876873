use crate::evaluator::with_evaluator::WithEvaluator;
use crate::evaluator::FinalQueryResults;
use crate::query::{Query, SelectElement};
use itertools::Itertools;
use pkb::pkb_context::PkbContext;

/// Renders evaluated rows as answer lines: `TRUE`/`FALSE` for boolean
/// queries, otherwise one space separated line per distinct tuple.
pub struct ResultProjector<'a> {
    pkb: &'a PkbContext,
    with: WithEvaluator<'a>,
}

impl<'a> ResultProjector<'a> {
    pub fn new(pkb: &'a PkbContext) -> Self {
        Self {
            pkb,
            with: WithEvaluator::new(pkb),
        }
    }

    pub fn project(&self, query: &Query, results: &FinalQueryResults) -> Vec<String> {
        let rows = match results {
            FinalQueryResults::Boolean(true) => return vec!["TRUE".to_string()],
            FinalQueryResults::Boolean(false) => return vec!["FALSE".to_string()],
            FinalQueryResults::Rows(rows) => rows,
        };

        rows.iter()
            .map(|row| {
                query
                    .select_elements()
                    .iter()
                    .zip(row)
                    .map(|(element, &value)| self.render(query, element, value))
                    .join(" ")
            })
            .unique()
            .collect()
    }

    fn render(&self, query: &Query, element: &SelectElement, value: u32) -> String {
        let Some(entity) = query.entity_of(element.synonym()) else {
            return value.to_string();
        };

        match element {
            SelectElement::Synonym(_) => match entity.table() {
                Some(table) => self
                    .pkb
                    .element_at(table, value)
                    .map_or_else(|| value.to_string(), |name| name.to_string()),
                None => value.to_string(),
            },
            SelectElement::Attribute(_, attribute) => self
                .with
                .attribute_value(entity, Some(*attribute), value)
                .map_or_else(|| value.to_string(), |value| value.to_string()),
        }
    }
}
