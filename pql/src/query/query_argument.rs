/// A clause argument as written in the query, before it is checked against
/// the declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Synonym(String),
    Attribute(String, String),
    Number(u32),
    Quoted(String),
    Any,
}

/// Expression argument of a pattern clause, holding the raw expression text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionArgument {
    Any,
    Exact(String),
    SubExpression(String),
}
