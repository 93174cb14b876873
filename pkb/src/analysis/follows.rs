use crate::analysis::procedures;
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::RelationshipType;
use crate::AstAnalysis;
use itertools::Itertools;
use simple::ast::Node;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FollowsAnalysis {
    /// follows relation map from follower to predecessor
    follows: HashMap<u32, u32>,
}

impl AstAnalysis for FollowsAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        for (_, statements) in procedures(ast)? {
            self.set_follows(statements);
        }

        for (&follower, &predecessor) in &self.follows {
            pkb.add_rs(RelationshipType::Follows, predecessor, follower);

            let mut current = predecessor;
            loop {
                pkb.add_rs(RelationshipType::FollowsT, current, follower);
                match self.follows.get(&current) {
                    Some(&previous) => current = previous,
                    None => break,
                }
            }
        }

        Ok(())
    }
}

impl FollowsAnalysis {
    fn set_follows(&mut self, statements: &[Node]) {
        for (predecessor, follower) in statements.iter().filter_map(Node::line).tuple_windows() {
            self.follows.insert(follower, predecessor);
        }

        for statement in statements {
            match statement {
                Node::While { statements, .. } => self.set_follows(statements.statements()),
                Node::If {
                    if_statements,
                    else_statements,
                    ..
                } => {
                    self.set_follows(if_statements.statements());
                    self.set_follows(else_statements.statements());
                }
                _ => {}
            }
        }
    }
}
