//! Lazy node sequences along each supported axis, plus node tests.

use crate::ast::{Axis, NodeTest};
use crate::iter::DescendantsOrSelf;
use crate::navigator::Navigator;

/// All nodes reachable from `node` along `axis`, in document order.
pub fn axis_nodes<'n, Nav>(
    nav: &'n Nav,
    axis: Axis,
    node: Nav::Node,
) -> Box<dyn Iterator<Item = Nav::Node> + 'n>
where
    Nav: Navigator + ?Sized,
{
    match axis {
        Axis::Child => nav.elements_of(node),
        Axis::Attribute => nav.attributes_of(node),
        Axis::SelfAxis => Box::new(std::iter::once(node)),
        Axis::Parent => Box::new(nav.parent_of(node).into_iter()),
        Axis::DescendantOrSelf => Box::new(DescendantsOrSelf::new(nav, node)),
    }
}

/// Whether `node` passes `test`. Wildcards only match named nodes, so the
/// unnamed root never matches `*`.
pub fn matches_node_test<Nav>(nav: &Nav, test: &NodeTest, node: Nav::Node) -> bool
where
    Nav: Navigator + ?Sized,
{
    match test {
        NodeTest::AnyNode => true,
        NodeTest::Wildcard => nav.name(node).is_some(),
        NodeTest::Name(name) => {
            let Some(qualified) = nav.name(node) else {
                return false;
            };
            let bound = name.prefix.as_deref().and_then(|p| nav.lookup_namespace(p));
            match (bound, nav.namespace_uri(node)) {
                (Some(uri), Some(node_uri)) => {
                    let local = qualified.split_once(':').map_or(qualified, |(_, l)| l);
                    uri == node_uri && local == name.local_part
                }
                _ => name.matches(qualified),
            }
        }
    }
}
