//! Greedy evaluation: resolving an expression so that it becomes true, creating
//! whatever nodes are missing on the way.
//!
//! A step first looks for existing matches with the read-only engine. Only when
//! there are none does it create one node (an element on the child axis, an
//! attribute on the attribute axis) and then apply each predicate to that node
//! so the predicate holds. Predicates that already hold are never reapplied,
//! which is what makes a repeated greedy resolve a no-op.

use crate::ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
use crate::context::{ExprContext, Limits};
use crate::engine;
use crate::error::XPathError;
use crate::iter;
use crate::navigator::Navigator;
use crate::operators;
use crate::view::{NodeSet, View};

/// Drives greedy evaluation over a mutably borrowed navigator.
pub struct Materializer<'m, Nav: Navigator + ?Sized> {
    nav: &'m mut Nav,
    limits: Limits,
}

impl<'m, Nav: Navigator + ?Sized> Materializer<'m, Nav> {
    pub fn new(nav: &'m mut Nav, limits: Limits) -> Self {
        Self { nav, limits }
    }

    /// Resolves `expr` greedily from `ctx.current`.
    ///
    /// Location paths are materialized and come back as node-sets. Boolean
    /// expressions built from paths and comparisons are made true and come back
    /// as `true`. Everything else is evaluated read-only.
    pub fn resolve(
        &mut self,
        expr: &Expression,
        ctx: ExprContext<Nav::Node>,
    ) -> Result<View<'static, Nav::Node>, XPathError> {
        let ctx = ExprContext { greedy: true, ..ctx };
        match expr {
            Expression::LocationPath(path) if path.is_context_node() => Ok(View::Node(ctx.current)),
            Expression::LocationPath(path) => {
                Ok(View::NodeSet(NodeSet::from_vec(self.resolve_path(path, ctx)?)))
            }
            Expression::BinaryOp {
                left,
                op: BinaryOperator::Union,
                right,
            } => {
                let left = self.resolve(left, ctx)?.into_nodes()?;
                let right = self.resolve(right, ctx)?.into_nodes()?;
                let merged = iter::in_document_order(&*self.nav, left.chain(right));
                Ok(View::NodeSet(NodeSet::from_vec(merged)))
            }
            Expression::BinaryOp { op, .. }
                if op.is_comparison() || matches!(op, BinaryOperator::And | BinaryOperator::Or) =>
            {
                self.satisfy(expr, ctx)?;
                Ok(View::Boolean(true))
            }
            _ => Ok(engine::evaluate(expr, &*self.nav, ctx).into_owned()),
        }
    }

    /// Materializes every step of `path`, returning the nodes of the last one.
    pub fn resolve_path(
        &mut self,
        path: &LocationPath,
        ctx: ExprContext<Nav::Node>,
    ) -> Result<Vec<Nav::Node>, XPathError> {
        let start = if path.is_absolute {
            self.nav.root()
        } else {
            ctx.current
        };
        let mut current = vec![start];
        let mut steps = path.steps.iter();
        while let Some(step) = steps.next() {
            let mut next = Vec::new();
            if step.is_descendant_or_self_abbreviation() {
                if let Some(target) = steps.next() {
                    for &origin in &current {
                        next.extend(self.resolve_descendant_step(target, origin)?);
                    }
                    current = iter::in_document_order(&*self.nav, next);
                    continue;
                }
            }
            for &node in &current {
                next.extend(self.resolve_step(step, node)?);
            }
            current = iter::in_document_order(&*self.nav, next);
        }
        Ok(current)
    }

    fn existing(&self, step: &Step, origin: Nav::Node) -> Vec<Nav::Node> {
        engine::step_nodes(step, &*self.nav, origin).collect()
    }

    fn resolve_step(
        &mut self,
        step: &Step,
        origin: Nav::Node,
    ) -> Result<Vec<Nav::Node>, XPathError> {
        let existing = self.existing(step, origin);
        if !existing.is_empty() {
            return Ok(existing);
        }
        match step.axis {
            Axis::Child | Axis::Attribute | Axis::DescendantOrSelf => {
                Ok(vec![self.create(step, origin)?])
            }
            Axis::SelfAxis => {
                if !engine::candidates(step, &*self.nav, origin).any(|n| n == origin) {
                    return Err(XPathError::CannotMaterialize(step.to_string()));
                }
                self.apply_predicates(step, origin, origin)?;
                Ok(vec![origin])
            }
            // There is no way to create a parent; nothing matches.
            Axis::Parent => Ok(existing),
        }
    }

    /// `//step`: reuse any matching descendant, otherwise create under `origin`.
    fn resolve_descendant_step(
        &mut self,
        step: &Step,
        origin: Nav::Node,
    ) -> Result<Vec<Nav::Node>, XPathError> {
        let found: Vec<_> = engine::descendant_step_nodes(step, &*self.nav, origin).collect();
        if !found.is_empty() {
            return Ok(found);
        }
        self.resolve_step(step, origin)
    }

    fn create(&mut self, step: &Step, parent: Nav::Node) -> Result<Nav::Node, XPathError> {
        let NodeTest::Name(name) = &step.node_test else {
            return Err(XPathError::CannotMaterialize(step.to_string()));
        };
        let node = match step.axis {
            Axis::Attribute => self.nav.create_attribute(parent, name)?,
            _ => self.nav.create_element(parent, name)?,
        };
        log::trace!("Created {} {:?} under {:?}", step.axis.name(), name.to_string(), parent);
        self.apply_predicates(step, parent, node)?;
        Ok(node)
    }

    /// Applies a step's predicates, in order, to a node that is the last
    /// candidate of that step under `origin`.
    fn apply_predicates(
        &mut self,
        step: &Step,
        origin: Nav::Node,
        node: Nav::Node,
    ) -> Result<(), XPathError> {
        for (index, predicate) in step.predicates.iter().enumerate() {
            let position = self.position_of(step, index, origin, node);
            self.satisfy(predicate, ExprContext::greedy(node, position))?;
        }
        Ok(())
    }

    /// Position of `node` among the candidates that pass the first `index`
    /// predicates.
    fn position_of(&self, step: &Step, index: usize, origin: Nav::Node, node: Nav::Node) -> usize {
        let mut count = 0;
        for candidate in engine::partially_filtered(step, index, &*self.nav, origin) {
            count += 1;
            if candidate == node {
                return count;
            }
        }
        count + 1
    }

    /// Makes a predicate hold for `ctx.current`, mutating the tree if needed.
    fn satisfy(
        &mut self,
        predicate: &Expression,
        ctx: ExprContext<Nav::Node>,
    ) -> Result<(), XPathError> {
        let outcome = match engine::evaluate(predicate, &*self.nav, ctx) {
            View::Number(n) if n == ctx.position as f64 => return Ok(()),
            View::Number(n) => Err(n),
            other => Ok(other.into_boolean()),
        };
        match outcome {
            Ok(true) => Ok(()),
            Err(target) => self.extend_to_position(target, ctx),
            Ok(false) => self.make_true(predicate, ctx),
        }
    }

    fn make_true(
        &mut self,
        expr: &Expression,
        ctx: ExprContext<Nav::Node>,
    ) -> Result<(), XPathError> {
        match expr {
            Expression::LocationPath(path) => self.resolve_path(path, ctx).map(|_| ()),
            Expression::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                self.satisfy(left, ctx)?;
                self.satisfy(right, ctx)
            }
            Expression::BinaryOp {
                left,
                op: BinaryOperator::Or,
                ..
            } => self.satisfy(left, ctx),
            Expression::BinaryOp {
                left,
                op: BinaryOperator::Union,
                right,
            } => {
                self.resolve(left, ctx)?;
                self.resolve(right, ctx).map(|_| ())
            }
            Expression::BinaryOp { left, op, right } if op.is_comparison() => {
                self.assign(*op, left, right, ctx)
            }
            other => Err(XPathError::CannotMaterialize(other.to_string())),
        }
    }

    /// Write-back for a failing comparison: resolves the path operand greedily
    /// and writes the other operand's string value into it.
    fn assign(
        &mut self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        ctx: ExprContext<Nav::Node>,
    ) -> Result<(), XPathError> {
        let (target, source) = if !left.is_location_path() && right.is_location_path() {
            (right, left)
        } else {
            (left, right)
        };
        let value = engine::evaluate(source, &*self.nav, ctx).into_string(&*self.nav);
        let nodes = self.resolve(target, ctx)?;
        operators::apply(op, self.nav, nodes, &value)
    }

    /// Duplicates `ctx.current` in place until it sits at `target`.
    fn extend_to_position(
        &mut self,
        target: f64,
        ctx: ExprContext<Nav::Node>,
    ) -> Result<(), XPathError> {
        if target.fract() != 0.0 || target < 1.0 || target < ctx.position as f64 {
            return Err(XPathError::CannotMaterialize(format!(
                "position {} from position {}",
                target, ctx.position
            )));
        }
        if target > self.limits.max_position as f64 {
            return Err(XPathError::PositionLimit {
                requested: target as usize,
                limit: self.limits.max_position,
            });
        }
        for _ in ctx.position..target as usize {
            self.nav.prepend_copy(ctx.current)?;
        }
        log::trace!("Extended {:?} to position {}", ctx.current, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::tests::{MockTree, create_test_tree};
    use crate::parser::parse_expression;

    fn put(tree: &mut MockTree, path: &str) -> Result<Vec<usize>, XPathError> {
        let _ = env_logger::builder().is_test(true).try_init();
        let expr = parse_expression(path)?;
        let root = tree.root();
        let view = Materializer::new(tree, Limits::default()).resolve(&expr, ExprContext::new(root))?;
        Ok(view.into_nodes()?.collect())
    }

    #[test]
    fn test_creates_missing_path() {
        let mut tree = MockTree::new();
        put(&mut tree, "/a/b/c").unwrap();
        assert_eq!(tree.render(), "<a><b><c/></b></a>");
    }

    #[test]
    fn test_existing_nodes_are_reused() {
        let mut tree = create_test_tree();
        let before = tree.render();
        let nodes = put(&mut tree, "/para").unwrap();
        assert_eq!(nodes, vec![1, 5]);
        assert_eq!(tree.render(), before);
    }

    #[test]
    fn test_predicate_assigns_attribute() {
        let mut tree = MockTree::new();
        put(&mut tree, "/a/b[@id='5']").unwrap();
        assert_eq!(tree.render(), "<a><b id=\"5\"/></a>");
        put(&mut tree, "/a/b[@id='5']").unwrap();
        assert_eq!(tree.render(), "<a><b id=\"5\"/></a>");
    }

    #[test]
    fn test_predicate_mismatch_creates_sibling() {
        let mut tree = MockTree::new();
        put(&mut tree, "/a/b[@id='1']").unwrap();
        put(&mut tree, "/a/b[@id='2']").unwrap();
        assert_eq!(tree.render(), "<a><b id=\"1\"/><b id=\"2\"/></a>");
    }

    #[test]
    fn test_positional_creation() {
        let mut tree = MockTree::new();
        let nodes = put(&mut tree, "/a/b[2]").unwrap();
        assert_eq!(tree.render(), "<a><b/><b/></a>");
        assert_eq!(nodes.len(), 1);

        let again = put(&mut tree, "/a/b[2]").unwrap();
        assert_eq!(again, nodes);
        assert_eq!(tree.render(), "<a><b/><b/></a>");

        put(&mut tree, "/a/b[4]").unwrap();
        assert_eq!(tree.render(), "<a><b/><b/><b/><b/></a>");
    }

    #[test]
    fn test_positional_copies_carry_earlier_predicates() {
        let mut tree = MockTree::new();
        put(&mut tree, "/a/b[@k='x'][3]").unwrap();
        assert_eq!(
            tree.render(),
            "<a><b k=\"x\"/><b k=\"x\"/><b k=\"x\"/></a>"
        );
    }

    #[test]
    fn test_nested_path_predicate() {
        let mut tree = MockTree::new();
        put(&mut tree, "/a/b[c/d='v']/e").unwrap();
        assert_eq!(tree.render(), "<a><b><c><d>v</d></c><e/></b></a>");
    }

    #[test]
    fn test_reversed_comparison_and_conjunction() {
        let mut tree = MockTree::new();
        put(&mut tree, "/a[1 = @n and @m >= 'q']").unwrap();
        assert_eq!(tree.render(), "<a n=\"1\" m=\"q\"/>");
    }

    #[test]
    fn test_top_level_comparison_is_made_true() {
        let mut tree = MockTree::new();
        let expr = parse_expression("/a/b = 'x'").unwrap();
        let view = Materializer::new(&mut tree, Limits::default())
            .resolve(&expr, ExprContext::new(0))
            .unwrap();
        assert!(matches!(view, View::Boolean(true)));
        assert_eq!(tree.render(), "<a><b>x</b></a>");
    }

    #[test]
    fn test_descendant_abbreviation() {
        let mut tree = MockTree::new();
        let a = tree.add_element(0, "a");
        let b = tree.add_element(a, "b");
        tree.add_element(b, "x");
        put(&mut tree, "//x").unwrap();
        assert_eq!(tree.render(), "<a><b><x/></b></a>");

        put(&mut tree, "//y").unwrap();
        assert_eq!(tree.render(), "<a><b><x/></b></a><y/>");
    }

    #[test]
    fn test_unsatisfiable_predicates_fault() {
        let mut tree = MockTree::new();
        assert!(matches!(put(&mut tree, "/*"), Err(XPathError::CannotMaterialize(_))));
        assert!(matches!(
            put(&mut tree, "/a[@n != '1']"),
            Err(XPathError::CannotMaterialize(_))
        ));
        assert!(matches!(
            put(&mut tree, "/b[false()]"),
            Err(XPathError::CannotMaterialize(_))
        ));
        assert!(matches!(
            put(&mut tree, "/c[count(@n) = 2]"),
            Err(XPathError::ReadOnlyView("number"))
        ));
    }

    #[test]
    fn test_position_limit() {
        let mut tree = MockTree::new();
        let expr = parse_expression("/a/b[50]").unwrap();
        let err = Materializer::new(&mut tree, Limits { max_position: 10 })
            .resolve(&expr, ExprContext::new(0))
            .unwrap_err();
        assert!(matches!(err, XPathError::PositionLimit { requested: 50, limit: 10 }));
    }

    #[test]
    fn test_position_behind_created_node_faults() {
        let mut tree = MockTree::new();
        put(&mut tree, "/a/b[@id='1']").unwrap();
        put(&mut tree, "/a/b[@id='2']").unwrap();
        // A new 'b' would be third, so it can never become the first.
        let err = put(&mut tree, "/a/b[1][@id='3']").unwrap_err();
        assert!(matches!(err, XPathError::CannotMaterialize(_)));

        // Counted among the 'b's with id 9, the new node is the first.
        put(&mut tree, "/a/b[@id='9'][1]").unwrap();
        assert_eq!(tree.render(), "<a><b id=\"1\"/><b id=\"2\"/><b/><b id=\"9\"/></a>");
    }
}
