//! The read-only evaluation engine.
//!
//! Evaluation never mutates the tree and never fails: function calls are
//! validated at parse time and every coercion is total. Location paths come
//! back as lazy node-sets that pull through axis, node test and predicates one
//! candidate at a time.

use crate::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step, UnaryOperator};
use crate::axes::{axis_nodes, matches_node_test};
use crate::context::ExprContext;
use crate::functions;
use crate::iter::{DescendantsOrSelf, contexts, in_document_order};
use crate::navigator::Navigator;
use crate::operators;
use crate::view::{NodeSet, View};
use itertools::Itertools;

/// Evaluates an expression against `ctx.current` without touching the tree.
pub fn evaluate<'n, Nav>(
    expr: &'n Expression,
    nav: &'n Nav,
    ctx: ExprContext<Nav::Node>,
) -> View<'n, Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    match expr {
        Expression::Literal(s) => View::Literal(s.clone()),
        Expression::Number(n) => View::Number(*n),
        Expression::LocationPath(path) if path.is_context_node() => View::Node(ctx.current),
        Expression::LocationPath(path) => View::NodeSet(select(path, nav, ctx.current)),
        Expression::FunctionCall { name, args } => {
            functions::evaluate_function(name, args, nav, ctx)
        }
        Expression::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => View::Boolean(
            evaluate(left, nav, ctx).into_boolean() && evaluate(right, nav, ctx).into_boolean(),
        ),
        Expression::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => View::Boolean(
            evaluate(left, nav, ctx).into_boolean() || evaluate(right, nav, ctx).into_boolean(),
        ),
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, nav, ctx);
            let right_val = evaluate(right, nav, ctx);
            operators::evaluate(*op, left_val, right_val, nav)
        }
        Expression::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => View::Number(-evaluate(expr, nav, ctx).into_number(nav)),
    }
}

/// Selects the nodes a location path addresses from `context`.
pub fn select<'n, Nav>(
    path: &'n LocationPath,
    nav: &'n Nav,
    context: Nav::Node,
) -> NodeSet<'n, Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    let start = if path.is_absolute { nav.root() } else { context };
    let mut nodes: Box<dyn Iterator<Item = Nav::Node> + 'n> = Box::new(std::iter::once(start));
    for step in &path.steps {
        nodes = Box::new(
            nodes
                .flat_map(move |node| step_nodes(step, nav, node))
                .unique(),
        );
    }
    // Child steps from nested origins (after `//` or `..`) can interleave.
    let may_interleave = path.steps.len() > 1
        && path
            .steps
            .iter()
            .any(|step| matches!(step.axis, Axis::DescendantOrSelf | Axis::Parent));
    if may_interleave {
        return NodeSet::from_vec(in_document_order(nav, nodes));
    }
    NodeSet::new(nodes)
}

/// Evaluates one step from one origin node: axis, node test, then predicates.
pub fn step_nodes<'n, Nav>(
    step: &'n Step,
    nav: &'n Nav,
    origin: Nav::Node,
) -> NodeSet<'n, Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    let mut nodes: Box<dyn Iterator<Item = Nav::Node> + 'n> =
        Box::new(candidates(step, nav, origin));
    for predicate in &step.predicates {
        nodes = filter(nodes, predicate, nav);
    }
    NodeSet::new(nodes)
}

/// Nodes on the step's axis passing its node test, before any predicate.
pub fn candidates<'n, Nav>(
    step: &'n Step,
    nav: &'n Nav,
    origin: Nav::Node,
) -> impl Iterator<Item = Nav::Node> + 'n
where
    Nav: Navigator + ?Sized,
{
    let test: &'n NodeTest = &step.node_test;
    axis_nodes(nav, step.axis, origin).filter(move |&node| matches_node_test(nav, test, node))
}

/// Nodes on the step's axis passing its node test and its first `count`
/// predicates.
pub fn partially_filtered<'n, Nav>(
    step: &'n Step,
    count: usize,
    nav: &'n Nav,
    origin: Nav::Node,
) -> Box<dyn Iterator<Item = Nav::Node> + 'n>
where
    Nav: Navigator + ?Sized,
{
    let mut nodes: Box<dyn Iterator<Item = Nav::Node> + 'n> =
        Box::new(candidates(step, nav, origin));
    for predicate in step.predicates.iter().take(count) {
        nodes = filter(nodes, predicate, nav);
    }
    nodes
}

/// `descendant-or-self::node()/step` from `origin`, as `//step` expands to.
pub fn descendant_step_nodes<'n, Nav>(
    step: &'n Step,
    nav: &'n Nav,
    origin: Nav::Node,
) -> NodeSet<'n, Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    NodeSet::from_vec(in_document_order(
        nav,
        DescendantsOrSelf::new(nav, origin).flat_map(move |node| step_nodes(step, nav, node)),
    ))
}

fn filter<'n, Nav>(
    nodes: Box<dyn Iterator<Item = Nav::Node> + 'n>,
    predicate: &'n Expression,
    nav: &'n Nav,
) -> Box<dyn Iterator<Item = Nav::Node> + 'n>
where
    Nav: Navigator + ?Sized,
{
    Box::new(
        contexts(nodes, predicate.uses_last())
            .filter(move |ctx| predicate_holds(predicate, nav, *ctx))
            .map(|ctx| ctx.current),
    )
}

/// Whether a predicate accepts `ctx.current`. A numeric predicate is a
/// position test; anything else is coerced to a boolean.
pub fn predicate_holds<Nav>(predicate: &Expression, nav: &Nav, ctx: ExprContext<Nav::Node>) -> bool
where
    Nav: Navigator + ?Sized,
{
    match evaluate(predicate, nav, ctx) {
        View::Number(n) => n == ctx.position as f64,
        other => other.into_boolean(),
    }
}
