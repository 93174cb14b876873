use crate::analysis::procedures;
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::{RelationshipType, StmtNo, TableIndex, TableType};
use crate::AstAnalysis;
use simple::ast::Node;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default, Clone)]
struct Access {
    uses: BTreeSet<TableIndex>,
    modifies: BTreeSet<TableIndex>,
}

impl Access {
    fn extend(&mut self, other: &Access) {
        self.uses.extend(&other.uses);
        self.modifies.extend(&other.modifies);
    }
}

/// Uses and Modifies at statement and procedure level. Containers inherit
/// the accesses of their bodies, call statements those of their callee.
#[derive(Debug, Default)]
pub struct UsesModifiesAnalysis {
    callee_first_order: Vec<String>,
    procedures: HashMap<String, Access>,
}

impl AstAnalysis for UsesModifiesAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        let bodies = procedures(ast)?.into_iter().collect::<HashMap<_, _>>();

        for name in &self.callee_first_order {
            let Some(statements) = bodies.get(name.as_str()) else {
                continue;
            };

            let access = self.visit_list(statements, pkb);
            let procedure = pkb.insert_at(TableType::Procedure, name);
            for &variable in &access.uses {
                pkb.add_rs(RelationshipType::UsesP, procedure, variable);
            }
            for &variable in &access.modifies {
                pkb.add_rs(RelationshipType::ModifiesP, procedure, variable);
            }

            self.procedures.insert(name.clone(), access);
        }

        Ok(())
    }
}

impl UsesModifiesAnalysis {
    pub fn new(callee_first_order: Vec<String>) -> Self {
        Self {
            callee_first_order,
            procedures: HashMap::new(),
        }
    }

    fn visit_list(&self, statements: &[Node], pkb: &mut PkbContext) -> Access {
        let mut access = Access::default();
        for statement in statements {
            access.extend(&self.visit(statement, pkb));
        }
        access
    }

    fn visit(&self, statement: &Node, pkb: &mut PkbContext) -> Access {
        let mut access = Access::default();

        match statement {
            Node::Assign {
                variable,
                expression,
                ..
            } => {
                access.modifies.insert(pkb.insert_at(TableType::Variable, variable));
                access.uses.extend(variables_of(expression, pkb));
            }
            Node::Read { variable, .. } => {
                access.modifies.insert(pkb.insert_at(TableType::Variable, variable));
            }
            Node::Print { variable, .. } => {
                access.uses.insert(pkb.insert_at(TableType::Variable, variable));
            }
            Node::Call { name, .. } => {
                if let Some(callee) = self.procedures.get(name) {
                    access.extend(callee);
                }
            }
            Node::While {
                condition,
                statements,
                ..
            } => {
                access.uses.extend(variables_of(condition, pkb));
                access.extend(&self.visit_list(statements.statements(), pkb));
            }
            Node::If {
                condition,
                if_statements,
                else_statements,
                ..
            } => {
                access.uses.extend(variables_of(condition, pkb));
                access.extend(&self.visit_list(if_statements.statements(), pkb));
                access.extend(&self.visit_list(else_statements.statements(), pkb));
            }
            _ => return access,
        }

        if let Some(line) = statement.line() {
            record(pkb, line, &access);
        }

        access
    }
}

fn variables_of(node: &Node, pkb: &mut PkbContext) -> Vec<TableIndex> {
    node.variables()
        .into_iter()
        .map(|variable| pkb.insert_at(TableType::Variable, variable))
        .collect()
}

fn record(pkb: &mut PkbContext, line: StmtNo, access: &Access) {
    for &variable in &access.uses {
        pkb.add_rs(RelationshipType::UsesS, line, variable);
    }
    for &variable in &access.modifies {
        pkb.add_rs(RelationshipType::ModifiesS, line, variable);
    }
}
