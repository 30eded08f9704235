//! Defines the contract every tree adapter implements so the engine can read and
//! grow the adapter's tree.
use crate::ast::QName;
use crate::error::NavigatorError;
use std::fmt::Debug;
use std::hash::Hash;

/// The universal contract for a navigable, mutable tree.
///
/// The evaluation engine is written exclusively against this trait. Node handles
/// are small `Copy` values owned by the adapter (typically an arena index);
/// handle equality is node identity.
///
/// Read operations take `&self` and never fail; a stale handle simply reads as
/// empty. Mutations take `&mut self` and report adapter faults.
pub trait Navigator {
    type Node: Copy + Eq + Hash + Debug + 'static;

    /// The document/tree root.
    fn root(&self) -> Self::Node;

    /// The parent of `node`, or `None` for the root (and for detached nodes).
    fn parent_of(&self, node: Self::Node) -> Option<Self::Node>;

    /// Child elements of `node`, in document order.
    fn elements_of(&self, node: Self::Node) -> Box<dyn Iterator<Item = Self::Node> + '_>;

    /// Attributes of `node`, in document order. Empty for non-elements.
    fn attributes_of(&self, node: Self::Node) -> Box<dyn Iterator<Item = Self::Node> + '_>;

    /// The qualified name (`prefix:local` or `local`). `None` for the root.
    fn name(&self, node: Self::Node) -> Option<&str>;

    /// The string value of the node: an attribute's value, or the concatenated
    /// text content of an element.
    fn text(&self, node: Self::Node) -> String;

    /// The namespace URI a name test's prefix stands for. Prefixes without a
    /// binding are compared literally.
    fn lookup_namespace(&self, _prefix: &str) -> Option<&str> {
        None
    }

    /// The namespace URI of a named node, if it is in one.
    fn namespace_uri(&self, _node: Self::Node) -> Option<&str> {
        None
    }

    /// Creates an element named `name` as the new last child of `parent`.
    fn create_element(
        &mut self,
        parent: Self::Node,
        name: &QName,
    ) -> Result<Self::Node, NavigatorError>;

    /// Creates an attribute named `name` as the new last attribute of `parent`.
    fn create_attribute(
        &mut self,
        parent: Self::Node,
        name: &QName,
    ) -> Result<Self::Node, NavigatorError>;

    /// Replaces the text content of `node`.
    fn set_text(&mut self, node: Self::Node, text: &str) -> Result<(), NavigatorError>;

    /// Inserts a deep copy of `node` immediately before it among its siblings and
    /// returns the copy. The handle of `node` stays valid and keeps pointing at
    /// the original, which is now one position further along.
    fn prepend_copy(&mut self, node: Self::Node) -> Result<Self::Node, NavigatorError>;

    /// Detaches `node` from its parent.
    fn remove(&mut self, node: Self::Node) -> Result<(), NavigatorError>;
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct MockNodeData {
        name: Option<String>,
        value: String,
        is_attribute: bool,
        children: Vec<usize>,
        attributes: Vec<usize>,
        parent: Option<usize>,
    }

    /// A minimal XML-like tree backed by a `Vec`. Removed nodes are unlinked but
    /// their slots are never reused, so handles stay unique for a test's lifetime.
    #[derive(Debug, Clone)]
    pub struct MockTree {
        nodes: Vec<MockNodeData>,
    }

    impl Default for MockTree {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTree {
        /// A tree holding only the (unnamed) root node, id 0.
        pub fn new() -> Self {
            Self {
                nodes: vec![MockNodeData::default()],
            }
        }

        fn push(&mut self, parent: usize, name: &str, is_attribute: bool) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNodeData {
                name: Some(name.to_string()),
                is_attribute,
                parent: Some(parent),
                ..Default::default()
            });
            if is_attribute {
                self.nodes[parent].attributes.push(id);
            } else {
                self.nodes[parent].children.push(id);
            }
            id
        }

        /// Appends an element and returns its id.
        pub fn add_element(&mut self, parent: usize, name: &str) -> usize {
            self.push(parent, name, false)
        }

        /// Appends an attribute with a value and returns its id.
        pub fn add_attribute(&mut self, parent: usize, name: &str, value: &str) -> usize {
            let id = self.push(parent, name, true);
            self.nodes[id].value = value.to_string();
            id
        }

        /// Sets the direct text of an element.
        pub fn set_value(&mut self, node: usize, value: &str) {
            self.nodes[node].value = value.to_string();
        }

        /// Renders the tree below the root as compact XML, e.g. `<a><b id="5"/></a>`.
        pub fn render(&self) -> String {
            let mut out = String::new();
            for &child in &self.nodes[0].children {
                self.render_node(child, &mut out);
            }
            out
        }

        fn render_node(&self, id: usize, out: &mut String) {
            let data = &self.nodes[id];
            let name = data.name.as_deref().unwrap_or_default();
            out.push('<');
            out.push_str(name);
            for &attr in &data.attributes {
                let attr = &self.nodes[attr];
                out.push_str(&format!(
                    " {}=\"{}\"",
                    attr.name.as_deref().unwrap_or_default(),
                    attr.value
                ));
            }
            if data.children.is_empty() && data.value.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            out.push_str(&data.value);
            for &child in &data.children {
                self.render_node(child, out);
            }
            out.push_str(&format!("</{}>", name));
        }

        fn copy_subtree(&mut self, id: usize, parent: usize) -> usize {
            let source = self.nodes[id].clone();
            let copy = self.nodes.len();
            self.nodes.push(MockNodeData {
                children: vec![],
                attributes: vec![],
                parent: Some(parent),
                ..source.clone()
            });
            for attr in source.attributes {
                let attr_copy = self.copy_subtree(attr, copy);
                self.nodes[copy].attributes.push(attr_copy);
            }
            for child in source.children {
                let child_copy = self.copy_subtree(child, copy);
                self.nodes[copy].children.push(child_copy);
            }
            copy
        }

        fn siblings_mut(&mut self, node: usize) -> Result<&mut Vec<usize>, NavigatorError> {
            let parent = self.nodes[node]
                .parent
                .ok_or_else(|| NavigatorError::new("the root node has no siblings"))?;
            Ok(if self.nodes[node].is_attribute {
                &mut self.nodes[parent].attributes
            } else {
                &mut self.nodes[parent].children
            })
        }
    }

    impl Navigator for MockTree {
        type Node = usize;

        fn root(&self) -> usize {
            0
        }

        fn parent_of(&self, node: usize) -> Option<usize> {
            self.nodes[node].parent
        }

        fn elements_of(&self, node: usize) -> Box<dyn Iterator<Item = usize> + '_> {
            Box::new(self.nodes[node].children.iter().copied())
        }

        fn attributes_of(&self, node: usize) -> Box<dyn Iterator<Item = usize> + '_> {
            Box::new(self.nodes[node].attributes.iter().copied())
        }

        fn name(&self, node: usize) -> Option<&str> {
            self.nodes[node].name.as_deref()
        }

        fn text(&self, node: usize) -> String {
            let data = &self.nodes[node];
            let mut text = data.value.clone();
            for &child in &data.children {
                text.push_str(&self.text(child));
            }
            text
        }

        fn create_element(&mut self, parent: usize, name: &QName) -> Result<usize, NavigatorError> {
            if self.nodes[parent].is_attribute {
                return Err(NavigatorError::new("attributes cannot hold elements"));
            }
            Ok(self.add_element(parent, &name.to_string()))
        }

        fn create_attribute(
            &mut self,
            parent: usize,
            name: &QName,
        ) -> Result<usize, NavigatorError> {
            if parent == 0 || self.nodes[parent].is_attribute {
                return Err(NavigatorError::new("only elements can hold attributes"));
            }
            Ok(self.add_attribute(parent, &name.to_string(), ""))
        }

        fn set_text(&mut self, node: usize, text: &str) -> Result<(), NavigatorError> {
            if node == 0 {
                return Err(NavigatorError::new("cannot set text on the root"));
            }
            let children = std::mem::take(&mut self.nodes[node].children);
            for child in children {
                self.nodes[child].parent = None;
            }
            self.nodes[node].value = text.to_string();
            Ok(())
        }

        fn prepend_copy(&mut self, node: usize) -> Result<usize, NavigatorError> {
            let parent = self.nodes[node]
                .parent
                .ok_or_else(|| NavigatorError::new("cannot prepend a copy of the root"))?;
            let copy = self.copy_subtree(node, parent);
            let siblings = self.siblings_mut(node)?;
            let index = siblings
                .iter()
                .position(|&s| s == node)
                .ok_or_else(|| NavigatorError::new("node is detached"))?;
            siblings.insert(index, copy);
            Ok(copy)
        }

        fn remove(&mut self, node: usize) -> Result<(), NavigatorError> {
            let siblings = self.siblings_mut(node)?;
            siblings.retain(|&s| s != node);
            self.nodes[node].parent = None;
            Ok(())
        }
    }

    /// Creates a simple mock tree for testing:
    /// <root> <!-- id 0 -->
    ///   <para id="p1" xml:lang="en">Hello</para> <!-- id 1, attrs 2 & 3 -->
    ///   <div/> <!-- id 4 -->
    ///   <para>World</para> <!-- id 5 -->
    /// </root>
    pub fn create_test_tree() -> MockTree {
        let mut tree = MockTree::new();
        let para1 = tree.add_element(0, "para");
        tree.add_attribute(para1, "id", "p1");
        tree.add_attribute(para1, "xml:lang", "en");
        tree.set_value(para1, "Hello");
        tree.add_element(0, "div");
        let para2 = tree.add_element(0, "para");
        tree.set_value(para2, "World");
        tree
    }
}
