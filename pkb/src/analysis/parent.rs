use crate::analysis::procedures;
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::RelationshipType;
use crate::AstAnalysis;
use simple::ast::Node;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ParentAnalysis {
    /// parent relation map from child to parent
    parent: HashMap<u32, u32>,
}

impl AstAnalysis for ParentAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        for (_, statements) in procedures(ast)? {
            self.visit(statements);
        }

        for (&child, &parent) in &self.parent {
            pkb.add_rs(RelationshipType::Parent, parent, child);

            let mut ancestor = Some(parent);
            while let Some(current) = ancestor {
                pkb.add_rs(RelationshipType::ParentT, current, child);
                ancestor = self.parent.get(&current).copied();
            }
        }

        Ok(())
    }
}

impl ParentAnalysis {
    fn visit(&mut self, statements: &[Node]) {
        for statement in statements {
            match statement {
                Node::While {
                    line, statements, ..
                } => {
                    self.set_parent(statements, *line);
                }
                Node::If {
                    line,
                    if_statements,
                    else_statements,
                    ..
                } => {
                    self.set_parent(if_statements, *line);
                    self.set_parent(else_statements, *line);
                }
                _ => {}
            }
        }
    }

    fn set_parent(&mut self, statements: &Node, parent_line: u32) {
        let children = statements.statements();

        for line in children.iter().filter_map(Node::line) {
            self.parent.insert(line, parent_line);
        }

        self.visit(children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{parse, SAMPLE_PROGRAM};
    use crate::relationship::ParamPosition;
    use itertools::Itertools;
    use rstest::rstest;

    #[rstest]
    #[case::no_containers("procedure main { x = 1; y = 2; }", &[])]
    #[case::while_container("procedure main { while (x > 0) { x = 1; y = 2; } }", &[(2, 1), (3, 1)])]
    #[case::nested_containers(
        "procedure main {
            while (x > 0) {
                if (x == 1) then { x = 3; } else { while (y < 2) { y = 4; } }
            }
        }",
        &[(2, 1), (3, 2), (4, 2), (5, 4)]
    )]
    fn test_parent_analysis(#[case] source: &str, #[case] expected_parent: &[(u32, u32)]) {
        let mut parent = ParentAnalysis::default();
        parent.analyze(&parse(source), &mut PkbContext::default()).unwrap();

        let parent = parent
            .parent
            .iter()
            .map(|(k, v)| (*k, *v))
            .sorted()
            .collect::<Vec<(u32, u32)>>();

        assert_eq!(parent, expected_parent);
    }

    #[test]
    fn test_parent_of_sample_program() {
        let mut pkb = PkbContext::default();
        ParentAnalysis::default()
            .analyze(&parse(SAMPLE_PROGRAM), &mut pkb)
            .unwrap();

        let direct = pkb
            .get_mappings(RelationshipType::Parent, ParamPosition::Both)
            .iter()
            .cloned()
            .sorted()
            .collect::<Vec<_>>();
        assert_eq!(direct, vec![vec![2, 3], vec![2, 4], vec![4, 5], vec![4, 6]]);

        assert!(pkb.is_rs(RelationshipType::ParentT, 2, 5));
        assert!(pkb.is_rs(RelationshipType::ParentT, 2, 6));
        assert!(!pkb.is_rs(RelationshipType::ParentT, 4, 3));
    }
}
