//! Binary operators: read-only evaluation (`test`) and greedy write-back (`apply`).

use crate::ast::BinaryOperator;
use crate::error::XPathError;
use crate::iter::in_document_order;
use crate::navigator::Navigator;
use crate::view::{NodeSet, View};
use std::cmp::Ordering;

/// Evaluates a binary operator over two already-evaluated operands.
///
/// `and`/`or` are handled here only for completeness; the engine short-circuits
/// them before both operands are evaluated.
pub fn evaluate<'n, Nav>(
    op: BinaryOperator,
    left: View<'n, Nav::Node>,
    right: View<'n, Nav::Node>,
    nav: &Nav,
) -> View<'n, Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    match op {
        BinaryOperator::Or => View::Boolean(left.into_boolean() || right.into_boolean()),
        BinaryOperator::And => View::Boolean(left.into_boolean() && right.into_boolean()),
        BinaryOperator::Union => View::NodeSet(union(left, right, nav)),
        op if op.is_comparison() => View::Boolean(test(op, left, right, nav)),
        arithmetic => {
            let l = left.into_number(nav);
            let r = right.into_number(nav);
            View::Number(match arithmetic {
                BinaryOperator::Plus => l + r,
                BinaryOperator::Minus => l - r,
                BinaryOperator::Multiply => l * r,
                BinaryOperator::Divide => l / r,
                _ => l % r,
            })
        }
    }
}

/// Merges two node views in document order. Scalar operands contribute nothing.
fn union<'n, Nav>(
    left: View<'n, Nav::Node>,
    right: View<'n, Nav::Node>,
    nav: &Nav,
) -> NodeSet<'n, Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    let l = left.into_nodes().unwrap_or_else(|_| NodeSet::empty());
    let r = right.into_nodes().unwrap_or_else(|_| NodeSet::empty());
    NodeSet::from_vec(in_document_order(nav, l.chain(r)))
}

/// Tests a comparison under XPath's loose rules. A node-set operand makes the
/// comparison existential: it holds if any member's string value satisfies it.
pub fn test<Nav>(
    op: BinaryOperator,
    left: View<'_, Nav::Node>,
    right: View<'_, Nav::Node>,
    nav: &Nav,
) -> bool
where
    Nav: Navigator + ?Sized,
{
    match (left, right) {
        (View::NodeSet(left), View::NodeSet(right)) => {
            let right: Vec<String> = right.map(|n| nav.text(n)).collect();
            left.map(|n| View::Literal(nav.text(n))).any(|l| {
                right
                    .iter()
                    .any(|r| compare(op, &l, &View::Literal(r.clone()), nav))
            })
        }
        (View::NodeSet(mut left), View::Boolean(b)) => {
            compare(op, &View::Boolean(left.next().is_some()), &View::Boolean(b), nav)
        }
        (View::Boolean(b), View::NodeSet(mut right)) => {
            compare(op, &View::Boolean(b), &View::Boolean(right.next().is_some()), nav)
        }
        (View::NodeSet(left), right) => {
            let mut left = left;
            left.any(|n| compare(op, &View::Literal(nav.text(n)), &right, nav))
        }
        (left, View::NodeSet(right)) => {
            let mut right = right;
            right.any(|n| compare(op, &left, &View::Literal(nav.text(n)), nav))
        }
        (left, right) => compare(op, &left, &right, nav),
    }
}

fn compare<Nav>(
    op: BinaryOperator,
    left: &View<'_, Nav::Node>,
    right: &View<'_, Nav::Node>,
    nav: &Nav,
) -> bool
where
    Nav: Navigator + ?Sized,
{
    match op {
        BinaryOperator::Equals => left.compare_to(right, nav) == Some(Ordering::Equal),
        BinaryOperator::NotEquals => left.compare_to(right, nav).is_some_and(|o| o.is_ne()),
        relational => {
            let ordering = left
                .scalar_number(nav)
                .partial_cmp(&right.scalar_number(nav));
            match relational {
                BinaryOperator::LessThan => ordering == Some(Ordering::Less),
                BinaryOperator::LessThanOrEqual => ordering.is_some_and(|o| o.is_le()),
                BinaryOperator::GreaterThan => ordering == Some(Ordering::Greater),
                BinaryOperator::GreaterThanOrEqual => ordering.is_some_and(|o| o.is_ge()),
                _ => false,
            }
        }
    }
}

/// Makes `left <op> value` true by writing `value` into every node of `left`.
///
/// Only operators that hold for equal operands (`=`, `<=`, `>=`) can be made
/// true this way. A scalar `left` cannot be written to.
pub fn apply<Nav>(
    op: BinaryOperator,
    nav: &mut Nav,
    left: View<'_, Nav::Node>,
    value: &str,
) -> Result<(), XPathError>
where
    Nav: Navigator + ?Sized,
{
    match op {
        BinaryOperator::Equals
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThanOrEqual => {
            let targets: Vec<_> = left.into_nodes()?.collect();
            for node in targets {
                log::trace!("Assigning '{}' to {:?}", value, node);
                nav.set_text(node, value)?;
            }
            Ok(())
        }
        other => Err(XPathError::CannotMaterialize(format!(
            "a '{}' comparison",
            other.symbol()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::tests::create_test_tree;

    fn paras() -> View<'static, usize> {
        View::NodeSet(NodeSet::from_vec(vec![1, 5]))
    }

    #[test]
    fn test_existential_equality() {
        let tree = create_test_tree();
        let world = || View::Literal("World".to_string());
        assert!(test(BinaryOperator::Equals, paras(), world(), &tree));
        assert!(test(BinaryOperator::Equals, world(), paras(), &tree));
        assert!(!test(BinaryOperator::Equals, paras(), View::Literal("Nope".into()), &tree));
        // "World" differs from "Hello", which is enough for the set.
        assert!(test(BinaryOperator::NotEquals, paras(), View::Literal("Hello".into()), &tree));
        assert!(!test(
            BinaryOperator::Equals,
            View::NodeSet(NodeSet::empty()),
            world(),
            &tree
        ));
    }

    #[test]
    fn test_node_set_against_node_set() {
        let tree = create_test_tree();
        let hello = View::NodeSet(NodeSet::from_vec(vec![1usize]));
        assert!(test(BinaryOperator::Equals, paras(), hello, &tree));
        let div = View::NodeSet(NodeSet::from_vec(vec![4usize]));
        assert!(!test(BinaryOperator::Equals, paras(), div, &tree));
    }

    #[test]
    fn test_unparsable_literal_never_compares() {
        let tree = create_test_tree();
        for op in [
            BinaryOperator::Equals,
            BinaryOperator::NotEquals,
            BinaryOperator::LessThan,
            BinaryOperator::GreaterThanOrEqual,
        ] {
            assert!(!test(op, View::Number(1.0), View::Literal("one".into()), &tree));
        }
    }

    #[test]
    fn test_boolean_coercion_in_comparison() {
        let tree = create_test_tree();
        assert!(test(BinaryOperator::Equals, paras(), View::Boolean(true), &tree));
        assert!(test(
            BinaryOperator::Equals,
            View::NodeSet(NodeSet::empty()),
            View::Boolean(false),
            &tree
        ));
        assert!(test(BinaryOperator::Equals, View::Number(2.0), View::Boolean(true), &tree));
    }

    #[test]
    fn test_arithmetic_and_union() {
        let tree = create_test_tree();
        let sum = evaluate(BinaryOperator::Plus, View::Number(2.0), View::Literal("3".into()), &tree);
        assert!(matches!(sum, View::Number(n) if n == 5.0));
        let modulo = evaluate(BinaryOperator::Modulo, View::Number(-7.0), View::Number(3.0), &tree);
        assert!(matches!(modulo, View::Number(n) if n == -1.0));

        let merged = evaluate(BinaryOperator::Union, paras(), View::Node(1usize), &tree);
        let nodes: Vec<_> = merged.into_nodes().unwrap().collect();
        assert_eq!(nodes, vec![1, 5]);
    }

    #[test]
    fn test_apply_writes_into_nodes() {
        let mut tree = create_test_tree();
        apply(BinaryOperator::Equals, &mut tree, paras(), "x").unwrap();
        assert_eq!(tree.text(1), "x");
        assert_eq!(tree.text(5), "x");
    }

    #[test]
    fn test_apply_rejects_scalars_and_strict_operators() {
        let mut tree = create_test_tree();
        let err = apply(BinaryOperator::Equals, &mut tree, View::Number(1.0), "x").unwrap_err();
        assert!(matches!(err, XPathError::ReadOnlyView("number")));
        let err = apply(BinaryOperator::NotEquals, &mut tree, paras(), "x").unwrap_err();
        assert!(matches!(err, XPathError::CannotMaterialize(_)));
    }
}
