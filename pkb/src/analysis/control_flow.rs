use crate::analysis::{first_line, procedures};
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::{RelationshipType, StmtNo, TableType};
use crate::AstAnalysis;
use simple::ast::Node;
use std::collections::HashMap;

/// Next and NextBip edges.
///
/// Within a procedure both relations share their edges, except that a call
/// statement in NextBip branches into the first statement of its callee and
/// the callee's exit statements return to the statement after the call.
#[derive(Debug, Default)]
pub struct ControlFlowAnalysis {
    callee_first_order: Vec<String>,
    /// statements through which control leaves each procedure
    exits: HashMap<String, Vec<StmtNo>>,
}

impl AstAnalysis for ControlFlowAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError> {
        let bodies = procedures(ast)?.into_iter().collect::<HashMap<_, _>>();

        for name in &self.callee_first_order {
            let Some(statements) = bodies.get(name.as_str()) else {
                continue;
            };

            let mut exits = Vec::new();
            self.link(statements, None, &mut exits, pkb);
            self.exits.insert(name.clone(), exits);
        }

        Ok(())
    }
}

impl ControlFlowAnalysis {
    pub fn new(callee_first_order: Vec<String>) -> Self {
        Self {
            callee_first_order,
            exits: HashMap::new(),
        }
    }

    /// Links a statement list whose last statement continues at `exit`, or
    /// leaves the procedure when `exit` is `None`.
    fn link(&self, statements: &[Node], exit: Option<StmtNo>, exits: &mut Vec<StmtNo>, pkb: &mut PkbContext) {
        for (index, statement) in statements.iter().enumerate() {
            let Some(line) = statement.line() else {
                continue;
            };
            let follower = statements.get(index + 1).and_then(Node::line).or(exit);

            match statement {
                Node::While { statements, .. } => {
                    if let Some(first) = first_line(statements) {
                        add_edge(pkb, line, first);
                    }
                    self.link(statements.statements(), Some(line), exits, pkb);
                    flow_to(pkb, line, follower, exits);
                }
                Node::If {
                    if_statements,
                    else_statements,
                    ..
                } => {
                    for branch in [if_statements, else_statements] {
                        if let Some(first) = first_line(branch) {
                            add_edge(pkb, line, first);
                        }
                        self.link(branch.statements(), follower, exits, pkb);
                    }
                }
                Node::Call { name, .. } => self.link_call(line, name, follower, exits, pkb),
                _ => flow_to(pkb, line, follower, exits),
            }
        }
    }

    fn link_call(
        &self,
        line: StmtNo,
        callee: &str,
        follower: Option<StmtNo>,
        exits: &mut Vec<StmtNo>,
        pkb: &mut PkbContext,
    ) {
        if let Some(follower) = follower {
            pkb.add_rs(RelationshipType::Next, line, follower);
        }

        let callee_first = pkb
            .index_of(TableType::Procedure, callee)
            .and_then(|procedure| pkb.affects_info.first_statement_of(procedure));
        if let Some(first) = callee_first {
            pkb.add_rs(RelationshipType::NextBip, line, first);
        }

        let callee_exits = self.exits.get(callee).map(Vec::as_slice).unwrap_or_default();
        match follower {
            Some(follower) => {
                for &callee_exit in callee_exits {
                    pkb.add_rs(RelationshipType::NextBip, callee_exit, follower);
                }
            }
            None => exits.extend_from_slice(callee_exits),
        }
    }
}

fn add_edge(pkb: &mut PkbContext, from: StmtNo, to: StmtNo) {
    pkb.add_rs(RelationshipType::Next, from, to);
    pkb.add_rs(RelationshipType::NextBip, from, to);
}

fn flow_to(pkb: &mut PkbContext, line: StmtNo, follower: Option<StmtNo>, exits: &mut Vec<StmtNo>) {
    match follower {
        Some(follower) => add_edge(pkb, line, follower),
        None => exits.push(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{parse, SAMPLE_PROGRAM};
    use crate::analysis::{CallsAnalysis, EntityAnalysis};
    use rstest::rstest;
    use std::collections::HashSet;

    fn extract(source: &str) -> PkbContext {
        let ast = parse(source);
        let mut pkb = PkbContext::default();
        EntityAnalysis.analyze(&ast, &mut pkb).unwrap();

        let mut calls = CallsAnalysis::default();
        calls.analyze(&ast, &mut pkb).unwrap();

        ControlFlowAnalysis::new(calls.callee_first_order().to_vec())
            .analyze(&ast, &mut pkb)
            .unwrap();

        pkb
    }

    #[rstest]
    #[case::sequence(1, &[2])]
    #[case::loop_entry(2, &[3])]
    #[case::if_branches(4, &[5, 6])]
    #[case::call_inside_loop(5, &[2])]
    #[case::else_back_to_loop(6, &[2])]
    #[case::call_in_sequence(8, &[9])]
    #[case::last_statement(9, &[])]
    fn test_next(#[case] from: StmtNo, #[case] expected: &[StmtNo]) {
        let pkb = extract(SAMPLE_PROGRAM);

        assert_eq!(
            pkb.next().next_statements(from),
            &expected.iter().copied().collect::<HashSet<_>>()
        );
    }

    #[rstest]
    #[case::call_enters_callee(5, &[7])]
    #[case::nested_call_enters_callee(8, &[10])]
    #[case::callee_returns_after_call(10, &[9])]
    #[case::callee_returns_to_loop(9, &[2])]
    #[case::plain_edge(1, &[2])]
    fn test_next_bip(#[case] from: StmtNo, #[case] expected: &[StmtNo]) {
        let pkb = extract(SAMPLE_PROGRAM);

        assert_eq!(
            pkb.next().next_bip_statements(from),
            &expected.iter().copied().collect::<HashSet<_>>()
        );
    }

    #[test]
    fn test_call_as_last_statement_propagates_exits() {
        let pkb = extract(
            "procedure a { call b; x = 1; } procedure b { if (y > 0) then { call c; } else { y = 1; } } procedure c { print y; }",
        );

        // c exits at 6 and b exits at 6 or 5, both return to statement 2
        assert_eq!(pkb.next().previous_bip_statements(2), &HashSet::from([5, 6]));
        assert!(pkb.next().next_statements(4).is_empty());
    }
}
