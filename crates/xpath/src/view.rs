//! The runtime value of an evaluated expression and its XPath coercions.

use crate::error::XPathError;
use crate::navigator::Navigator;
use std::cmp::Ordering;
use std::fmt;

/// An ordered, duplicate-free, single-pass sequence of node handles.
///
/// Node-sets produced by read-only evaluation are lazy: each step pulls from the
/// previous one, so no intermediate collection exists. Once drained they cannot
/// be restarted, which is why every coercion below takes `self` by value.
pub struct NodeSet<'n, N> {
    iter: Box<dyn Iterator<Item = N> + 'n>,
}

impl<'n, N: 'n> NodeSet<'n, N> {
    pub fn new(iter: impl Iterator<Item = N> + 'n) -> Self {
        Self {
            iter: Box::new(iter),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn from_vec(nodes: Vec<N>) -> Self {
        Self::new(nodes.into_iter())
    }
}

impl<N> Iterator for NodeSet<'_, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        self.iter.next()
    }
}

impl<N> fmt::Debug for NodeSet<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeSet(..)")
    }
}

/// Represents the possible result types of an expression evaluation.
#[derive(Debug)]
pub enum View<'n, N> {
    Boolean(bool),
    Number(f64),
    Literal(String),
    /// Exactly one node: the context node itself (`.`).
    Node(N),
    NodeSet(NodeSet<'n, N>),
}

impl<'n, N: Copy + 'n> View<'n, N> {
    pub fn kind(&self) -> &'static str {
        match self {
            View::Boolean(_) => "boolean",
            View::Number(_) => "number",
            View::Literal(_) => "literal",
            View::Node(_) => "node",
            View::NodeSet(_) => "node-set",
        }
    }

    pub fn is_nodes(&self) -> bool {
        matches!(self, View::Node(_) | View::NodeSet(_))
    }

    /// Coerces the view to a boolean as per XPath 1.0 rules.
    pub fn into_boolean(self) -> bool {
        match self {
            View::Boolean(b) => b,
            View::Number(n) => n != 0.0 && !n.is_nan(),
            View::Literal(s) => !s.is_empty(),
            View::Node(_) => true,
            View::NodeSet(mut nodes) => nodes.next().is_some(),
        }
    }

    /// Coerces the view to a number as per XPath 1.0 rules.
    pub fn into_number<Nav>(self, nav: &Nav) -> f64
    where
        Nav: Navigator<Node = N> + ?Sized,
    {
        match self {
            View::Number(n) => n,
            View::Boolean(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            other => parse_number(&other.into_string(nav)),
        }
    }

    /// Coerces the view to a string as per XPath 1.0 rules: a node-set yields
    /// the string value of its first node.
    pub fn into_string<Nav>(self, nav: &Nav) -> String
    where
        Nav: Navigator<Node = N> + ?Sized,
    {
        match self {
            View::Literal(s) => s,
            View::Number(n) => format_number(n),
            View::Boolean(b) => b.to_string(),
            View::Node(node) => nav.text(node),
            View::NodeSet(mut nodes) => nodes.next().map(|n| nav.text(n)).unwrap_or_default(),
        }
    }

    /// The nodes of a node view. Scalar views are read-only and cannot be
    /// written through.
    pub fn into_nodes(self) -> Result<NodeSet<'n, N>, XPathError> {
        match self {
            View::Node(node) => Ok(NodeSet::new(std::iter::once(node))),
            View::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::ReadOnlyView(other.kind())),
        }
    }

    /// Detaches the view from whatever it borrows by draining lazy node-sets.
    pub fn into_owned(self) -> View<'static, N>
    where
        N: 'static,
    {
        match self {
            View::Boolean(b) => View::Boolean(b),
            View::Number(n) => View::Number(n),
            View::Literal(s) => View::Literal(s),
            View::Node(node) => View::Node(node),
            View::NodeSet(nodes) => View::NodeSet(NodeSet::from_vec(nodes.collect())),
        }
    }
}

impl<N: Copy + PartialEq> View<'_, N> {
    /// Orders two single values under the coercions `=` uses: booleans win over
    /// numbers, numbers over strings. A single node compares by identity against
    /// another node and by string value against everything else.
    ///
    /// Returns `None` when the operands are incomparable: one side is a node-set,
    /// or a numeric comparison involves NaN (including a literal that does not
    /// parse as a number).
    pub fn compare_to<Nav>(&self, other: &Self, nav: &Nav) -> Option<Ordering>
    where
        Nav: Navigator<Node = N> + ?Sized,
    {
        match (self, other) {
            (View::NodeSet(_), _) | (_, View::NodeSet(_)) => None,
            (View::Node(a), View::Node(b)) if a == b => Some(Ordering::Equal),
            (View::Node(a), View::Node(b)) => {
                Some(nav.text(*a).cmp(&nav.text(*b))).filter(|o| o.is_ne())
            }
            (View::Boolean(a), b) => Some(a.cmp(&b.scalar_boolean())),
            (a, View::Boolean(b)) => Some(a.scalar_boolean().cmp(b)),
            (View::Number(a), b) => a.partial_cmp(&parse_number(&b.scalar_string(nav))),
            (a, View::Number(b)) => parse_number(&a.scalar_string(nav)).partial_cmp(b),
            (a, b) => Some(a.scalar_string(nav).cmp(&b.scalar_string(nav))),
        }
    }

    pub(crate) fn scalar_boolean(&self) -> bool {
        match self {
            View::Boolean(b) => *b,
            View::Number(n) => *n != 0.0 && !n.is_nan(),
            View::Literal(s) => !s.is_empty(),
            View::Node(_) => true,
            View::NodeSet(_) => false,
        }
    }

    pub(crate) fn scalar_number<Nav>(&self, nav: &Nav) -> f64
    where
        Nav: Navigator<Node = N> + ?Sized,
    {
        match self {
            View::Number(n) => *n,
            View::Boolean(b) => f64::from(u8::from(*b)),
            other => parse_number(&other.scalar_string(nav)),
        }
    }

    pub(crate) fn scalar_string<Nav>(&self, nav: &Nav) -> String
    where
        Nav: Navigator<Node = N> + ?Sized,
    {
        match self {
            View::Literal(s) => s.clone(),
            View::Number(n) => format_number(*n),
            View::Boolean(b) => b.to_string(),
            View::Node(node) => nav.text(*node),
            View::NodeSet(_) => String::new(),
        }
    }
}

/// Parses a string as an XPath number: optional surrounding whitespace, an
/// optional minus sign, digits with at most one decimal point. Anything else
/// is NaN.
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let well_formed = !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1;
    if well_formed {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Formats a number as an XPath string: integers without a fractional part,
/// `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::tests::create_test_tree;

    #[test]
    fn test_boolean_coercion() {
        assert!(!View::<usize>::Number(f64::NAN).into_boolean());
        assert!(!View::<usize>::Number(0.0).into_boolean());
        assert!(View::<usize>::Number(-2.5).into_boolean());
        assert!(!View::<usize>::Literal(String::new()).into_boolean());
        assert!(View::<usize>::Literal("false".into()).into_boolean());
        assert!(!View::NodeSet(NodeSet::<usize>::empty()).into_boolean());
        assert!(View::NodeSet(NodeSet::from_vec(vec![1usize])).into_boolean());
    }

    #[test]
    fn test_string_and_number_coercion() {
        let tree = create_test_tree();
        assert_eq!(View::<usize>::Number(3.0).into_string(&tree), "3");
        assert_eq!(View::<usize>::Number(0.5).into_string(&tree), "0.5");
        assert_eq!(View::<usize>::Boolean(true).into_number(&tree), 1.0);
        assert_eq!(View::NodeSet(NodeSet::from_vec(vec![5usize, 1])).into_string(&tree), "World");
        assert!(View::<usize>::Literal("12abc".into()).into_number(&tree).is_nan());
        assert_eq!(View::<usize>::Literal(" 12.5 ".into()).into_number(&tree), 12.5);
    }

    #[test]
    fn test_parse_number_rejects_float_spellings() {
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("NaN").is_nan());
        assert!(parse_number("1e3").is_nan());
        assert!(parse_number("").is_nan());
        assert!(parse_number(".").is_nan());
        assert_eq!(parse_number("-.5"), -0.5);
    }

    #[test]
    fn test_compare_to() {
        let tree = create_test_tree();
        let five = View::<usize>::Number(5.0);
        assert_eq!(five.compare_to(&View::Literal("5".into()), &tree), Some(Ordering::Equal));
        assert_eq!(five.compare_to(&View::Literal("abc".into()), &tree), None);
        assert_eq!(
            View::<usize>::Boolean(true).compare_to(&View::Literal("x".into()), &tree),
            Some(Ordering::Equal)
        );
        assert_eq!(View::Node(1usize).compare_to(&View::Node(1), &tree), Some(Ordering::Equal));
        assert_ne!(View::Node(1usize).compare_to(&View::Node(5), &tree), Some(Ordering::Equal));
        assert_eq!(
            View::Node(1usize).compare_to(&View::Literal("Hello".into()), &tree),
            Some(Ordering::Equal)
        );
        assert_eq!(
            View::NodeSet(NodeSet::<usize>::empty()).compare_to(&five, &tree),
            None
        );
    }

    #[test]
    fn test_into_nodes_rejects_scalars() {
        let err = View::<usize>::Literal("x".into()).into_nodes().unwrap_err();
        assert!(matches!(err, XPathError::ReadOnlyView("literal")));
        let nodes: Vec<_> = View::Node(3usize).into_nodes().unwrap().collect();
        assert_eq!(nodes, vec![3]);
    }
}
