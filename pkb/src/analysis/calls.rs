use crate::analysis::procedures;
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::TableType;
use crate::AstAnalysis;
use simple::ast::Node;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Builds Calls and Calls*, rejecting calls to undefined procedures and
/// recursion. Also yields the procedures ordered callees first, which later
/// analyses rely on to see every callee before its callers.
#[derive(Debug, Default)]
pub struct CallsAnalysis {
    calls: BTreeMap<String, BTreeSet<String>>,
    order: Vec<String>,
}

impl AstAnalysis for CallsAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        for (name, statements) in procedures(ast)? {
            self.calls.entry(name.to_string()).or_default();
            self.collect(name, statements, pkb)?;
        }

        pkb.calls.close();
        self.order = self.topological_order()?;

        Ok(())
    }
}

impl CallsAnalysis {
    pub fn callee_first_order(&self) -> &[String] {
        &self.order
    }

    fn collect(&mut self, caller: &str, statements: &[Node], pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        for statement in statements {
            match statement {
                Node::Call { line, name } => {
                    if pkb.index_of(TableType::Procedure, name).is_none() {
                        return Err(ExtractionError::UndefinedProcedure {
                            caller: caller.to_string(),
                            callee: name.clone(),
                        });
                    }

                    pkb.add_calls(*line, caller, name);
                    self.calls
                        .entry(caller.to_string())
                        .or_default()
                        .insert(name.clone());
                }
                Node::While { statements, .. } => self.collect(caller, statements.statements(), pkb)?,
                Node::If {
                    if_statements,
                    else_statements,
                    ..
                } => {
                    self.collect(caller, if_statements.statements(), pkb)?;
                    self.collect(caller, else_statements.statements(), pkb)?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn topological_order(&self) -> Result<Vec<String>, ExtractionError> {
        let mut order = Vec::with_capacity(self.calls.len());
        let mut visiting = HashSet::new();
        let mut done = HashSet::new();

        for procedure in self.calls.keys() {
            self.visit(procedure, &mut visiting, &mut done, &mut order)?;
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        procedure: &'a str,
        visiting: &mut HashSet<&'a str>,
        done: &mut HashSet<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<(), ExtractionError> {
        if done.contains(procedure) {
            return Ok(());
        }
        if !visiting.insert(procedure) {
            return Err(ExtractionError::CyclicCalls(procedure.to_string()));
        }

        for callee in self.calls.get(procedure).into_iter().flatten() {
            self.visit(callee, visiting, done, order)?;
        }

        visiting.remove(procedure);
        done.insert(procedure);
        order.push(procedure.to_string());

        Ok(())
    }
}
