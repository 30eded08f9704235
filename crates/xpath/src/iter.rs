//! Lazy iterator building blocks for node-set traversal.

use crate::context::ExprContext;
use crate::navigator::Navigator;
use itertools::Itertools;

/// Pre-order traversal of the element subtree below (and including) a node.
///
/// Children are pushed in reverse so they pop in document order.
pub struct DescendantsOrSelf<'n, Nav: Navigator + ?Sized> {
    nav: &'n Nav,
    stack: Vec<Nav::Node>,
}

impl<'n, Nav: Navigator + ?Sized> DescendantsOrSelf<'n, Nav> {
    pub fn new(nav: &'n Nav, origin: Nav::Node) -> Self {
        Self {
            nav,
            stack: vec![origin],
        }
    }
}

impl<Nav: Navigator + ?Sized> Iterator for DescendantsOrSelf<'_, Nav> {
    type Item = Nav::Node;

    fn next(&mut self) -> Option<Nav::Node> {
        let node = self.stack.pop()?;
        let mark = self.stack.len();
        self.stack.extend(self.nav.elements_of(node));
        self.stack[mark..].reverse();
        Some(node)
    }
}

/// Pairs every candidate with the context a predicate sees for it.
///
/// Positions are counted as the sequence is pulled, so it stays lazy. Only when
/// `with_size` is set (the predicate calls `last()`) are the candidates drained
/// up front to learn the set size.
pub fn contexts<'n, N>(
    candidates: impl Iterator<Item = N> + 'n,
    with_size: bool,
) -> Box<dyn Iterator<Item = ExprContext<N>> + 'n>
where
    N: Copy + 'n,
{
    if with_size {
        let all: Vec<N> = candidates.collect();
        let size = all.len();
        Box::new(
            all.into_iter()
                .enumerate()
                .map(move |(i, node)| ExprContext::at(node, i + 1, Some(size))),
        )
    } else {
        Box::new(
            candidates
                .enumerate()
                .map(|(i, node)| ExprContext::at(node, i + 1, None)),
        )
    }
}

/// Deduplicates `nodes` and sorts them into document order.
pub fn in_document_order<Nav>(nav: &Nav, nodes: impl IntoIterator<Item = Nav::Node>) -> Vec<Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    let mut nodes: Vec<_> = nodes.into_iter().unique().collect();
    if nodes.len() > 1 {
        nodes.sort_by_cached_key(|&node| document_key(nav, node));
    }
    nodes
}

/// Sibling slots from the root down to `node`. A node's attributes sort
/// before its children, and an ancestor's key is a prefix of its descendants'.
fn document_key<Nav>(nav: &Nav, node: Nav::Node) -> Vec<(u8, usize)>
where
    Nav: Navigator + ?Sized,
{
    let mut key = Vec::new();
    let mut current = node;
    while let Some(parent) = nav.parent_of(current) {
        let slot = match nav.attributes_of(parent).position(|a| a == current) {
            Some(index) => (0, index),
            None => (
                1,
                nav.elements_of(parent)
                    .position(|c| c == current)
                    .unwrap_or(usize::MAX),
            ),
        };
        key.push(slot);
        current = parent;
    }
    key.reverse();
    key
}
