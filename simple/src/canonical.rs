use crate::ast::Node;

/// Renders an arithmetic expression fully parenthesised, so `cenX + x + y`
/// becomes `((cenX+x)+y)`. Returns `None` for nodes that are not expressions.
pub fn canonical_form(expression: &Node) -> Option<String> {
    match expression {
        Node::Reference { name } => Some(name.clone()),
        Node::Constant { value } => Some(value.to_string()),
        Node::Expression {
            left,
            operator,
            right,
        } => Some(format!(
            "({}{}{})",
            canonical_form(left)?,
            operator,
            canonical_form(right)?
        )),
        _ => None,
    }
}

/// Canonical forms of every subtree of `expression`, the whole expression
/// included, in post-order.
pub fn subexpressions(expression: &Node) -> Vec<String> {
    let mut result = Vec::new();
    collect_subexpressions(expression, &mut result);
    result
}

fn collect_subexpressions(expression: &Node, result: &mut Vec<String>) -> Option<String> {
    let form = match expression {
        Node::Expression {
            left,
            operator,
            right,
        } => {
            let left = collect_subexpressions(left, result)?;
            let right = collect_subexpressions(right, result)?;
            format!("({}{}{})", left, operator, right)
        }
        _ => canonical_form(expression)?,
    };

    result.push(form.clone());
    Some(form)
}
