use crate::analysis::procedures;
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::{StatementKind, TableIndex, TableType};
use crate::AstAnalysis;
use simple::ast::Node;

/// Registers procedures, statements, variables and constants.
#[derive(Debug, Default)]
pub struct EntityAnalysis;

impl AstAnalysis for EntityAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        for (name, statements) in procedures(ast)? {
            if pkb.index_of(TableType::Procedure, name).is_some() {
                return Err(ExtractionError::DuplicateProcedure(name.to_string()));
            }

            let procedure = pkb.insert_at(TableType::Procedure, name);
            if let Some(first) = statements.first().and_then(Node::line) {
                pkb.affects_info.add_first_statement(procedure, first);
            }

            self.register(statements, procedure, pkb);
        }

        Ok(())
    }
}

impl EntityAnalysis {
    fn register(&self, statements: &[Node], procedure: TableIndex, pkb: &mut PkbContext) {
        for statement in statements {
            let Some(line) = statement.line() else {
                continue;
            };
            pkb.affects_info.add_statement_of(line, procedure);

            match statement {
                Node::Assign {
                    variable,
                    expression,
                    ..
                } => {
                    pkb.add_statement(line, StatementKind::Assign);
                    pkb.insert_at(TableType::Variable, variable);
                    register_leaves(expression, pkb);
                }
                Node::Read { variable, .. } => {
                    pkb.add_statement(line, StatementKind::Read);
                    pkb.insert_at(TableType::Variable, variable);
                }
                Node::Print { variable, .. } => {
                    pkb.add_statement(line, StatementKind::Print);
                    pkb.insert_at(TableType::Variable, variable);
                }
                Node::Call { .. } => {
                    // callee names are validated and interned by the calls analysis
                    pkb.add_statement(line, StatementKind::Call);
                }
                Node::While {
                    condition,
                    statements,
                    ..
                } => {
                    pkb.add_statement(line, StatementKind::While);
                    register_leaves(condition, pkb);
                    self.register(statements.statements(), procedure, pkb);
                }
                Node::If {
                    condition,
                    if_statements,
                    else_statements,
                    ..
                } => {
                    pkb.add_statement(line, StatementKind::If);
                    register_leaves(condition, pkb);
                    self.register(if_statements.statements(), procedure, pkb);
                    self.register(else_statements.statements(), procedure, pkb);
                }
                _ => {}
            }
        }
    }
}

fn register_leaves(node: &Node, pkb: &mut PkbContext) {
    for variable in node.variables() {
        pkb.insert_at(TableType::Variable, variable);
    }
    for constant in node.constants() {
        pkb.insert_at(TableType::Constant, &constant.to_string());
    }
}
