//! Queued mutations and how each one drives evaluation over a tree.

use pathwright_xpath::{
    ExprContext, Expression, Limits, Materializer, Navigator, XPathError, evaluate,
};
use std::collections::HashSet;
use std::fmt;

/// One mutation built from one parsed path.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Create whatever the path describes and does not exist yet.
    Put(Expression),
    /// Like `Put`, then set the text of every resolved node.
    PutValue(Expression, String),
    /// Detach every node the path selects. Creates nothing.
    Remove(Expression),
}

impl Effect {
    pub fn expression(&self) -> &Expression {
        match self {
            Effect::Put(expr) | Effect::PutValue(expr, _) | Effect::Remove(expr) => expr,
        }
    }

    /// Applies the effect to `nav`, starting from its root.
    ///
    /// A fault aborts immediately; whatever was mutated before it stays.
    pub fn perform<Nav>(&self, nav: &mut Nav, limits: Limits) -> Result<(), XPathError>
    where
        Nav: Navigator + ?Sized,
    {
        log::debug!("Performing {}", self);
        let root = ExprContext::new(nav.root());
        match self {
            Effect::Put(expr) => {
                Materializer::new(nav, limits).resolve(expr, root)?;
            }
            Effect::PutValue(expr, value) => {
                let nodes: Vec<_> = Materializer::new(nav, limits)
                    .resolve(expr, root)?
                    .into_nodes()?
                    .collect();
                // Setting an ancestor's text replaces its descendants anyway.
                let targets: HashSet<_> = nodes.iter().copied().collect();
                for node in nodes {
                    if has_ancestor_in(&*nav, node, &targets) {
                        log::trace!("Skipping {:?}, an ancestor gets the value", node);
                        continue;
                    }
                    nav.set_text(node, value)?;
                }
            }
            Effect::Remove(expr) => {
                let targets: Vec<_> = evaluate(expr, &*nav, root).into_nodes()?.collect();
                if targets.is_empty() {
                    log::warn!("Nothing to remove at '{}'", expr);
                }
                for node in targets {
                    // Already gone with an ancestor removed earlier in this loop.
                    if node != nav.root() && nav.parent_of(node).is_none() {
                        continue;
                    }
                    nav.remove(node)?;
                }
            }
        }
        Ok(())
    }
}

fn has_ancestor_in<Nav>(nav: &Nav, node: Nav::Node, targets: &HashSet<Nav::Node>) -> bool
where
    Nav: Navigator + ?Sized,
{
    std::iter::successors(nav.parent_of(node), |&parent| nav.parent_of(parent))
        .any(|ancestor| targets.contains(&ancestor))
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Put(expr) => write!(f, "put({})", expr),
            Effect::PutValue(expr, value) => write!(f, "put({}, {:?})", expr, value),
            Effect::Remove(expr) => write!(f, "remove({})", expr),
        }
    }
}
