use crate::error::ExtractionError;
use simple::ast::Node;

mod calls;
mod control_flow;
mod entities;
mod follows;
mod parent;
mod pattern;
mod uses_modifies;

pub use calls::CallsAnalysis;
pub use control_flow::ControlFlowAnalysis;
pub use entities::EntityAnalysis;
pub use follows::FollowsAnalysis;
pub use parent::ParentAnalysis;
pub use pattern::PatternAnalysis;
pub use uses_modifies::UsesModifiesAnalysis;

/// Name and top level statements of every procedure, in source order.
pub(crate) fn procedures(ast: &Node) -> Result<Vec<(&str, &[Node])>, ExtractionError> {
    match ast {
        Node::Program { procedures } => Ok(procedures
            .iter()
            .filter_map(|procedure| match procedure {
                Node::Procedure { name, body } => Some((name.as_str(), body.statements())),
                _ => None,
            })
            .collect()),
        _ => Err(ExtractionError::NotAProgram),
    }
}

fn first_line(statements: &Node) -> Option<u32> {
    statements.statements().first().and_then(Node::line)
}
