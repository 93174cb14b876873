use pkb::relationship::RelationshipType;
use std::collections::HashSet;
use std::rc::Rc;

/// Uniform access to the facts of one relationship family. `None` stands for
/// a wildcard side.
pub trait RelationshipEvaluator {
    /// Whether any fact matches the two (possibly wildcard) sides.
    fn holds(&mut self, rs: RelationshipType, left: Option<u32>, right: Option<u32>) -> bool;

    /// Right hand values related to `left`, or every right hand value.
    fn rights(&mut self, rs: RelationshipType, left: Option<u32>) -> Rc<HashSet<u32>>;

    /// Left hand values related to `right`, or every left hand value.
    fn lefts(&mut self, rs: RelationshipType, right: Option<u32>) -> Rc<HashSet<u32>>;

    fn pairs(&mut self, rs: RelationshipType) -> Rc<Vec<(u32, u32)>>;
}
