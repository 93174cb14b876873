use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

#[derive(PartialEq, Clone, Copy)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self {
            Operator::Plus => write!(f, "+"),
            Operator::Minus => write!(f, "-"),
            Operator::Times => write!(f, "*"),
            Operator::Divide => write!(f, "/"),
            Operator::Modulo => write!(f, "%"),
        }
    }
}

impl Debug for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(PartialEq, Clone, Copy)]
pub enum RelationOperator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl Debug for RelationOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self {
            RelationOperator::Less => write!(f, "<"),
            RelationOperator::LessEqual => write!(f, "<="),
            RelationOperator::Greater => write!(f, ">"),
            RelationOperator::GreaterEqual => write!(f, ">="),
            RelationOperator::Equal => write!(f, "=="),
            RelationOperator::NotEqual => write!(f, "!="),
        }
    }
}

#[derive(PartialEq, Clone)]
pub enum Node {
    Program {
        procedures: Vec<Node>,
    },
    Procedure {
        name: String,
        body: Box<Node>,
    },
    StatementList {
        statements: Vec<Node>,
    },
    Assign {
        line: u32,
        variable: String,
        expression: Box<Node>,
    },
    Read {
        line: u32,
        variable: String,
    },
    Print {
        line: u32,
        variable: String,
    },
    Call {
        line: u32,
        name: String,
    },
    While {
        line: u32,
        condition: Box<Node>,
        statements: Box<Node>,
    },
    If {
        line: u32,
        condition: Box<Node>,
        if_statements: Box<Node>,
        else_statements: Box<Node>,
    },
    Not {
        condition: Box<Node>,
    },
    And {
        left: Box<Node>,
        right: Box<Node>,
    },
    Or {
        left: Box<Node>,
        right: Box<Node>,
    },
    Relation {
        left: Box<Node>,
        operator: RelationOperator,
        right: Box<Node>,
    },
    Expression {
        left: Box<Node>,
        operator: Operator,
        right: Box<Node>,
    },
    Reference {
        name: String,
    },
    Constant {
        value: u32,
    },
}

impl Node {
    /// Statement number of a statement node, `None` for everything else.
    pub fn line(&self) -> Option<u32> {
        match self {
            Node::Assign { line, .. }
            | Node::Read { line, .. }
            | Node::Print { line, .. }
            | Node::Call { line, .. }
            | Node::While { line, .. }
            | Node::If { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Direct children statements of a statement list, empty for other nodes.
    pub fn statements(&self) -> &[Node] {
        match self {
            Node::StatementList { statements } => statements,
            _ => &[],
        }
    }

    /// Variable names referenced anywhere in an expression or condition subtree.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut variables = BTreeSet::new();
        self.collect_leaves(&mut variables, &mut BTreeSet::new());
        variables
    }

    /// Constants appearing anywhere in an expression or condition subtree.
    pub fn constants(&self) -> BTreeSet<u32> {
        let mut constants = BTreeSet::new();
        self.collect_leaves(&mut BTreeSet::new(), &mut constants);
        constants
    }

    fn collect_leaves<'a>(&'a self, variables: &mut BTreeSet<&'a str>, constants: &mut BTreeSet<u32>) {
        match self {
            Node::Reference { name } => {
                variables.insert(name);
            }
            Node::Constant { value } => {
                constants.insert(*value);
            }
            Node::Not { condition } => condition.collect_leaves(variables, constants),
            Node::And { left, right } | Node::Or { left, right } => {
                left.collect_leaves(variables, constants);
                right.collect_leaves(variables, constants);
            }
            Node::Relation { left, right, .. } | Node::Expression { left, right, .. } => {
                left.collect_leaves(variables, constants);
                right.collect_leaves(variables, constants);
            }
            _ => {}
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self {
            Node::Program { procedures } => {
                write!(f, "Program {:?}", procedures)
            }
            Node::Procedure { name, body } => {
                write!(f, "Procedure: {} {:?}", name, body)
            }
            Node::StatementList { statements } => {
                write!(f, "{:?}", statements)
            }
            Node::Assign {
                line,
                variable,
                expression,
            } => {
                write!(f, "{}. {} = {:?};", line, variable, expression)
            }
            Node::Read { line, variable } => {
                write!(f, "{}. read {};", line, variable)
            }
            Node::Print { line, variable } => {
                write!(f, "{}. print {};", line, variable)
            }
            Node::Call { line, name } => {
                write!(f, "{}. call {};", line, name)
            }
            Node::While {
                line,
                condition,
                statements,
            } => {
                write!(f, "{}. while ({:?}) {:?}", line, condition, statements)
            }
            Node::If {
                line,
                condition,
                if_statements,
                else_statements,
            } => {
                write!(
                    f,
                    "{}. if ({:?}) then {:?} else {:?}",
                    line, condition, if_statements, else_statements
                )
            }
            Node::Not { condition } => {
                write!(f, "!({:?})", condition)
            }
            Node::And { left, right } => {
                write!(f, "({:?}) && ({:?})", left, right)
            }
            Node::Or { left, right } => {
                write!(f, "({:?}) || ({:?})", left, right)
            }
            Node::Relation {
                left,
                operator,
                right,
            } => {
                write!(f, "{:?} {:?} {:?}", left, operator, right)
            }
            Node::Expression {
                left,
                operator,
                right,
            } => {
                write!(f, "({:?} {:?} {:?})", left, operator, right)
            }
            Node::Reference { name } => {
                write!(f, "{}", name)
            }
            Node::Constant { value } => {
                write!(f, "{}", value)
            }
        }
    }
}
