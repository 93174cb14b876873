use crate::analysis::{
    CallsAnalysis, ControlFlowAnalysis, EntityAnalysis, FollowsAnalysis, ParentAnalysis, PatternAnalysis,
    UsesModifiesAnalysis,
};
use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use crate::relationship::TableType;
use crate::AstAnalysis;
use simple::ast::Node;
use tracing::debug;

/// Runs every analysis over a parsed program and returns the populated,
/// from then on immutable, knowledge base.
pub struct DesignExtractor;

impl DesignExtractor {
    pub fn extract(ast: &Node) -> Result<PkbContext, ExtractionError> {
        let mut pkb = PkbContext::default();

        EntityAnalysis.analyze(ast, &mut pkb)?;

        let mut calls = CallsAnalysis::default();
        calls.analyze(ast, &mut pkb)?;
        let order = calls.callee_first_order().to_vec();

        let analyses: Vec<Box<dyn AstAnalysis>> = vec![
            Box::new(FollowsAnalysis::default()),
            Box::new(ParentAnalysis::default()),
            Box::new(UsesModifiesAnalysis::new(order.clone())),
            Box::new(ControlFlowAnalysis::new(order)),
            Box::new(PatternAnalysis),
        ];
        for mut analysis in analyses {
            analysis.analyze(ast, &mut pkb)?;
        }

        debug!(
            procedures = pkb.table(TableType::Procedure).len(),
            statements = pkb.statements().len(),
            variables = pkb.table(TableType::Variable).len(),
            constants = pkb.table(TableType::Constant).len(),
            "extract.done"
        );

        Ok(pkb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{parse, SAMPLE_PROGRAM};
    use crate::pkb_context::Entity;
    use crate::relationship::{ParamPosition, RelationshipType};
    use std::collections::HashSet;

    #[test]
    fn test_sample_program_facts() -> Result<(), ExtractionError> {
        let pkb = DesignExtractor::extract(&parse(SAMPLE_PROGRAM))?;

        assert!(pkb.is_calls("a", "b"));
        assert!(!pkb.is_calls("a", "c"));
        assert!(pkb.is_calls_t("a", "c"));
        assert_eq!(pkb.get_right(RelationshipType::Follows, 1), &HashSet::from([2]));
        assert_eq!(pkb.next().next_statements(4), &HashSet::from([5, 6]));
        assert_eq!(
            pkb.get_left_named(
                RelationshipType::ModifiesS,
                Entity::Named(TableType::Variable, "x")
            ),
            &HashSet::from([2, 4, 5, 7, 9])
        );
        assert_eq!(
            pkb.get_mappings(RelationshipType::Calls, ParamPosition::Left).len(),
            2
        );

        Ok(())
    }

    #[test]
    fn test_not_a_program() {
        let ast = Node::Constant { value: 1 };

        assert_eq!(
            DesignExtractor::extract(&ast).err(),
            Some(ExtractionError::NotAProgram)
        );
    }
}
