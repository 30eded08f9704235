//! Defines the Abstract Syntax Tree (AST) for path expressions.
//!
//! Every node is immutable once parsed. The `Display` impls render an expression
//! back into path syntax, which is what error messages and logs show.

use std::fmt;

/// The top-level expression that can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
}

impl Expression {
    /// Checks if the expression is a `LocationPath` variant.
    pub fn is_location_path(&self) -> bool {
        matches!(self, Expression::LocationPath(_))
    }

    /// Checks if the expression is a `BinaryOp` variant.
    pub fn is_binary_op(&self) -> bool {
        matches!(self, Expression::BinaryOp { .. })
    }

    /// True if evaluating this expression needs the size of the context node-set,
    /// i.e. it calls `last()` outside of any nested step predicate.
    pub fn uses_last(&self) -> bool {
        match self {
            Expression::FunctionCall { name, args } => {
                name == "last" || args.iter().any(Expression::uses_last)
            }
            Expression::BinaryOp { left, right, .. } => left.uses_last() || right.uses_last(),
            Expression::UnaryOp { expr, .. } => expr.uses_last(),
            Expression::Literal(_) | Expression::Number(_) | Expression::LocationPath(_) => false,
        }
    }
}

/// A unary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

/// A binary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
    // Set
    Union,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "div",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::Union => "|",
        }
    }
}

/// Represents a full location path, like `/child::foo` or `bar[1]/@id`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// True if the path starts from the tree root (e.g., `/foo`).
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

impl LocationPath {
    /// True for the bare `.` path, which denotes the context node itself.
    pub fn is_context_node(&self) -> bool {
        !self.is_absolute
            && self.steps.len() == 1
            && self.steps[0].axis == Axis::SelfAxis
            && self.steps[0].node_test == NodeTest::AnyNode
            && self.steps[0].predicates.is_empty()
    }
}

/// Represents a single step in a location path, like `child::foo[position() > 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
}

impl Step {
    /// The implicit `descendant-or-self::node()` step that `//` expands into.
    pub fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::AnyNode,
            predicates: vec![],
        }
    }

    pub fn is_descendant_or_self_abbreviation(&self) -> bool {
        self.axis == Axis::DescendantOrSelf
            && self.node_test == NodeTest::AnyNode
            && self.predicates.is_empty()
    }
}

/// The axis of movement from the context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Attribute,
    SelfAxis,
    Parent,
    DescendantOrSelf,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::Child => "child",
            Axis::Attribute => "attribute",
            Axis::SelfAxis => "self",
            Axis::Parent => "parent",
            Axis::DescendantOrSelf => "descendant-or-self",
        }
    }
}

/// A test to apply to nodes on a given axis to see if they should be included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A qualified name test (e.g., `foo`, `ns:bar`).
    Name(QName),
    /// A wildcard test (`*`).
    Wildcard,
    /// The `node()` type test, matching any node on the axis.
    AnyNode,
}

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_part: String,
}

impl QName {
    pub fn new(local_part: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_part: local_part.into(),
        }
    }

    /// Splits a `prefix:local` string. A name without a colon has no prefix.
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((prefix, local)) => Self {
                prefix: Some(prefix.to_string()),
                local_part: local.to_string(),
            },
            None => Self::new(name),
        }
    }

    /// Compares against a qualified name as reported by a navigator.
    pub fn matches(&self, qualified: &str) -> bool {
        match (&self.prefix, qualified.split_once(':')) {
            (Some(prefix), Some((p, local))) => prefix == p && self.local_part == local,
            (None, None) => self.local_part == qualified,
            _ => false,
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_part),
            None => write!(f, "{}", self.local_part),
        }
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Name(name) => write!(f, "{}", name),
            NodeTest::Wildcard => write!(f, "*"),
            NodeTest::AnyNode => write!(f, "node()"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.axis, &self.node_test) {
            (Axis::Child, test) => write!(f, "{}", test)?,
            (Axis::Attribute, test) => write!(f, "@{}", test)?,
            (Axis::SelfAxis, NodeTest::AnyNode) => write!(f, ".")?,
            (Axis::Parent, NodeTest::AnyNode) => write!(f, "..")?,
            (axis, test) => write!(f, "{}::{}", axis.name(), test)?,
        }
        for predicate in &self.predicates {
            write!(f, "[{}]", predicate)?;
        }
        Ok(())
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absolute && self.steps.is_empty() {
            return write!(f, "/");
        }
        let mut first = true;
        for step in &self.steps {
            if step.is_descendant_or_self_abbreviation() {
                write!(f, "/")?;
                if first && !self.is_absolute {
                    write!(f, ".")?;
                }
                first = false;
                continue;
            }
            if !first || self.is_absolute {
                write!(f, "/")?;
            }
            write!(f, "{}", step)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Expression::Literal(s) => write!(f, "'{}'", s),
            Expression::Number(n) => write!(f, "{}", n),
            Expression::LocationPath(path) => write!(f, "{}", path),
            Expression::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::BinaryOp {
                left,
                op: BinaryOperator::Union,
                right,
            } => write!(f, "{} | {}", left, right),
            Expression::BinaryOp { left, op, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => write!(f, "-{}", expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_matching() {
        let plain = QName::parse("para");
        assert!(plain.matches("para"));
        assert!(!plain.matches("x:para"));

        let prefixed = QName::parse("fo:block");
        assert_eq!(prefixed.prefix.as_deref(), Some("fo"));
        assert!(prefixed.matches("fo:block"));
        assert!(!prefixed.matches("block"));
        assert_eq!(prefixed.to_string(), "fo:block");
    }

    #[test]
    fn test_uses_last_ignores_nested_paths() {
        let last = Expression::FunctionCall {
            name: "last".into(),
            args: vec![],
        };
        assert!(last.uses_last());

        let nested = Expression::LocationPath(LocationPath {
            is_absolute: false,
            steps: vec![Step {
                axis: Axis::Child,
                node_test: NodeTest::Name(QName::new("b")),
                predicates: vec![last],
            }],
        });
        assert!(!nested.uses_last());
    }
}
