use crate::analysis::procedures;
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::TableType;
use crate::AstAnalysis;
use simple::ast::Node;
use simple::canonical::{canonical_form, subexpressions};

#[derive(Debug, Default)]
pub struct PatternAnalysis;

impl AstAnalysis for PatternAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        for (_, statements) in procedures(ast)? {
            visit(statements, pkb);
        }

        Ok(())
    }
}

fn visit(statements: &[Node], pkb: &mut PkbContext) {
    for statement in statements {
        match statement {
            Node::Assign {
                line,
                variable,
                expression,
            } => {
                let variable = pkb.insert_at(TableType::Variable, variable);
                if let Some(full) = canonical_form(expression) {
                    pkb.patterns.add_assign_full_expression(*line, variable, &full);
                }
                for sub in subexpressions(expression) {
                    pkb.patterns.add_assign_sub_expression(*line, variable, &sub);
                }
            }
            Node::While {
                line,
                condition,
                statements,
            } => {
                for variable in condition.variables() {
                    let variable = pkb.insert_at(TableType::Variable, variable);
                    pkb.patterns.add_while_variable(*line, variable);
                }
                visit(statements.statements(), pkb);
            }
            Node::If {
                line,
                condition,
                if_statements,
                else_statements,
            } => {
                for variable in condition.variables() {
                    let variable = pkb.insert_at(TableType::Variable, variable);
                    pkb.patterns.add_if_variable(*line, variable);
                }
                visit(if_statements.statements(), pkb);
                visit(else_statements.statements(), pkb);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{parse, SAMPLE_PROGRAM};
    use std::collections::HashSet;

    #[test]
    fn test_patterns_of_sample_program() {
        let mut pkb = PkbContext::default();
        PatternAnalysis.analyze(&parse(SAMPLE_PROGRAM), &mut pkb).unwrap();

        let patterns = pkb.patterns();
        assert_eq!(patterns.assigns_for_full_expression("((cenX+x)+y)"), &HashSet::from([3]));
        assert_eq!(patterns.assigns_for_sub_expression("x"), &HashSet::from([3, 9]));
        assert!(patterns.assigns_for_sub_expression("(x+y)").is_empty());
        assert_eq!(patterns.assigns_for_full_expression("0"), &HashSet::from([1]));

        let x = pkb.index_of(TableType::Variable, "x").unwrap();
        let cen_x = pkb.index_of(TableType::Variable, "cenX").unwrap();
        assert_eq!(patterns.whiles_for_variable(x), &HashSet::from([2]));
        assert_eq!(patterns.ifs_for_variable(cen_x), &HashSet::from([4]));
        assert!(patterns.ifs_for_variable(x).is_empty());
    }
}
