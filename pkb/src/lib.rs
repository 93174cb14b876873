use crate::error::ExtractionError;
use crate::pkb_context::PkbContext;
use simple::ast::Node;

pub mod affects_info_kb;
pub mod analysis;
pub mod calls_kb;
pub mod design_extractor;
pub mod error;
pub mod next_kb;
pub mod pattern_kb;
pub mod pkb_context;
pub mod relation_table;
pub mod relationship;
pub mod table;

/// One pass of the design extractor over the whole program AST.
pub trait AstAnalysis {
    fn analyze(&mut self, ast: &Node, pkb: &mut PkbContext) -> Result<(), ExtractionError>;
}
