//! A `serde_json::Value` exposed as a navigable, growable element tree.
//!
//! Object members become child elements named by their key, arrays become runs
//! of same-name siblings, and keys carrying the attribute prefix (`@` by
//! default) become attributes. The top-level value is the root node itself, so
//! `/config/name` addresses `value["config"]["name"]`.

use crate::arena::{Arena, NodeId};
use crate::error::TreeError;
use pathwright_xpath::{Navigator, NavigatorError, QName};
use serde_json::{Map, Value};

pub const DEFAULT_ATTRIBUTE_PREFIX: &str = "@";

/// What an element or attribute holds.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonContent {
    /// Children and attributes live in the arena.
    Object,
    /// A primitive, or a value kept verbatim (nested arrays).
    Scalar(Value),
}

#[derive(Debug, Clone)]
pub struct JsonNode {
    name: Option<String>,
    is_attribute: bool,
    /// Came from an array, so it serializes as one even when alone.
    in_array: bool,
    content: JsonContent,
}

impl JsonNode {
    fn element(name: &str, content: JsonContent, in_array: bool) -> Self {
        Self {
            name: Some(name.to_string()),
            is_attribute: false,
            in_array,
            content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonTree {
    arena: Arena<JsonNode>,
    root: NodeId,
    attribute_prefix: String,
}

impl Default for JsonTree {
    fn default() -> Self {
        Self::empty(DEFAULT_ATTRIBUTE_PREFIX)
    }
}

impl JsonTree {
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        Self::with_attribute_prefix(value, DEFAULT_ATTRIBUTE_PREFIX)
    }

    pub fn with_attribute_prefix(value: Value, prefix: &str) -> Result<Self, TreeError> {
        let mut tree = Self::empty(prefix);
        tree.fill(tree.root, value)?;
        Ok(tree)
    }

    /// A tree holding `{}`.
    fn empty(prefix: &str) -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(
            JsonNode {
                name: None,
                is_attribute: false,
                in_array: false,
                content: JsonContent::Object,
            },
            None,
        );
        Self {
            arena,
            root,
            attribute_prefix: prefix.to_string(),
        }
    }

    pub fn attribute_prefix(&self) -> &str {
        &self.attribute_prefix
    }

    fn attribute_name<'k>(&self, key: &'k str) -> Option<&'k str> {
        if self.attribute_prefix.is_empty() {
            return None;
        }
        key.strip_prefix(self.attribute_prefix.as_str())
    }

    /// Stores `value` as the content of the fresh, childless node `id`.
    fn fill(&mut self, id: NodeId, value: Value) -> Result<(), TreeError> {
        let Value::Object(members) = value else {
            self.arena.entry_mut(id)?.data.content = JsonContent::Scalar(value);
            return Ok(());
        };
        for (key, member) in members {
            if let Some(name) = self.attribute_name(&key) {
                let attr = JsonNode {
                    name: Some(name.to_string()),
                    is_attribute: true,
                    in_array: false,
                    content: JsonContent::Scalar(member),
                };
                self.arena.append_attribute(id, attr)?;
                continue;
            }
            match member {
                Value::Array(items) if !items.is_empty() => {
                    for item in items {
                        self.fill_child(id, &key, item, true)?;
                    }
                }
                other => self.fill_child(id, &key, other, false)?,
            }
        }
        Ok(())
    }

    fn fill_child(
        &mut self,
        parent: NodeId,
        name: &str,
        value: Value,
        in_array: bool,
    ) -> Result<(), TreeError> {
        match value {
            Value::Object(_) => {
                let node = JsonNode::element(name, JsonContent::Object, in_array);
                let child = self.arena.append_child(parent, node)?;
                self.fill(child, value)
            }
            scalar => {
                let node = JsonNode::element(name, JsonContent::Scalar(scalar), in_array);
                self.arena.append_child(parent, node).map(|_| ())
            }
        }
    }

    /// Rebuilds the JSON value. Same-name siblings collapse into one array
    /// member at the position of the first of them.
    pub fn to_value(&self) -> Value {
        self.value_of(self.root)
    }

    pub fn into_value(self) -> Value {
        self.to_value()
    }

    fn value_of(&self, id: NodeId) -> Value {
        let Some(entry) = self.arena.get(id) else {
            return Value::Null;
        };
        if let JsonContent::Scalar(value) = &entry.data.content {
            return value.clone();
        }

        let mut object = Map::new();
        for &attr in &entry.attributes {
            if let Some(attr_entry) = self.arena.get(attr) {
                let name = attr_entry.data.name.as_deref().unwrap_or_default();
                object.insert(format!("{}{}", self.attribute_prefix, name), self.value_of(attr));
            }
        }

        let mut groups: Vec<(&str, Vec<NodeId>, bool)> = Vec::new();
        for &child in &entry.children {
            let Some(child_entry) = self.arena.get(child) else {
                continue;
            };
            let name = child_entry.data.name.as_deref().unwrap_or_default();
            match groups.iter_mut().find(|(n, _, _)| *n == name) {
                Some((_, members, _)) => members.push(child),
                None => groups.push((name, vec![child], child_entry.data.in_array)),
            }
        }
        for (name, members, in_array) in groups {
            let value = if members.len() > 1 || in_array {
                Value::Array(members.iter().map(|&m| self.value_of(m)).collect())
            } else {
                self.value_of(members[0])
            };
            object.insert(name.to_string(), value);
        }
        Value::Object(object)
    }

    /// Prepares `parent` to take a child: an empty primitive turns into an
    /// empty object, anything else primitive faults.
    fn make_container(&mut self, parent: NodeId) -> Result<(), TreeError> {
        let node = &mut self.arena.entry_mut(parent)?.data;
        if node.is_attribute {
            return Err(TreeError::illegal("attributes cannot hold children"));
        }
        let convertible = match &node.content {
            JsonContent::Object => return Ok(()),
            JsonContent::Scalar(Value::Null) => true,
            JsonContent::Scalar(Value::String(s)) => s.is_empty(),
            JsonContent::Scalar(_) => false,
        };
        if !convertible {
            return Err(TreeError::illegal("cannot add child to a primitive value"));
        }
        node.content = JsonContent::Object;
        Ok(())
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(entry) = self.arena.get(id) else {
            return;
        };
        match &entry.data.content {
            JsonContent::Scalar(Value::Null) => {}
            JsonContent::Scalar(Value::String(s)) => out.push_str(s),
            JsonContent::Scalar(other) => out.push_str(&other.to_string()),
            JsonContent::Object => {
                for &child in &entry.children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

impl TryFrom<Value> for JsonTree {
    type Error = TreeError;

    fn try_from(value: Value) -> Result<Self, TreeError> {
        Self::from_value(value)
    }
}

impl From<JsonTree> for Value {
    fn from(tree: JsonTree) -> Self {
        tree.into_value()
    }
}

impl Navigator for JsonTree {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|entry| entry.parent)
    }

    fn elements_of(&self, node: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        match self.arena.get(node) {
            Some(entry) => Box::new(entry.children.iter().copied()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn attributes_of(&self, node: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        match self.arena.get(node) {
            Some(entry) => Box::new(entry.attributes.iter().copied()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn name(&self, node: NodeId) -> Option<&str> {
        self.arena.get(node)?.data.name.as_deref()
    }

    fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn create_element(&mut self, parent: NodeId, name: &QName) -> Result<NodeId, NavigatorError> {
        self.make_container(parent)?;
        let node = JsonNode::element(
            &name.to_string(),
            JsonContent::Scalar(Value::String(String::new())),
            false,
        );
        let id = self.arena.append_child(parent, node)?;
        log::trace!("Created member '{}'", name);
        Ok(id)
    }

    fn create_attribute(&mut self, parent: NodeId, name: &QName) -> Result<NodeId, NavigatorError> {
        self.make_container(parent)?;
        let node = JsonNode {
            name: Some(name.to_string()),
            is_attribute: true,
            in_array: false,
            content: JsonContent::Scalar(Value::String(String::new())),
        };
        Ok(self.arena.append_attribute(parent, node)?)
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), NavigatorError> {
        let entry = self.arena.entry_mut(node)?;
        if !entry.children.is_empty() || !entry.attributes.is_empty() {
            return Err(TreeError::illegal("cannot set text on a non-empty object").into());
        }
        entry.data.content = JsonContent::Scalar(Value::String(text.to_string()));
        Ok(())
    }

    fn prepend_copy(&mut self, node: NodeId) -> Result<NodeId, NavigatorError> {
        let copy = self.arena.copy_before(node)?;
        // The run now has at least two members and is an array either way.
        for id in [copy, node] {
            if let Some(entry) = self.arena.get_mut(id) {
                entry.data.in_array = !entry.data.is_attribute;
            }
        }
        Ok(copy)
    }

    fn remove(&mut self, node: NodeId) -> Result<(), NavigatorError> {
        Ok(self.arena.detach(node)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn child(tree: &JsonTree, parent: NodeId, name: &str) -> NodeId {
        let _ = env_logger::builder().is_test(true).try_init();
        tree.elements_of(parent)
            .find(|&c| tree.name(c) == Some(name))
            .unwrap()
    }

    #[test]
    fn test_members_arrays_and_attributes() {
        let tree = JsonTree::from_value(json!({
            "config": {"@id": 7, "name": "x", "tags": ["a", "b"]}
        }))
        .unwrap();
        let config = child(&tree, tree.root(), "config");
        let tags: Vec<_> = tree
            .elements_of(config)
            .filter(|&c| tree.name(c) == Some("tags"))
            .map(|c| tree.text(c))
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
        let id = tree.attributes_of(config).next().unwrap();
        assert_eq!(tree.name(id), Some("id"));
        assert_eq!(tree.text(id), "7");
        assert_eq!(tree.text(config), "xab");
    }

    #[test]
    fn test_round_trip() {
        let value = json!({
            "a": {"@k": "v", "list": [1, {"b": true}], "single": ["only"], "empty": [], "nested": [[1, 2]], "none": null},
            "s": "text"
        });
        assert_eq!(JsonTree::from_value(value.clone()).unwrap().into_value(), value);
        assert_eq!(JsonTree::try_from(json!([1, 2])).unwrap().into_value(), json!([1, 2]));
        assert_eq!(JsonTree::default().into_value(), json!({}));
    }

    #[test]
    fn test_growing_primitives() {
        let mut tree = JsonTree::default();
        let root = tree.root();
        let config = tree.create_element(root, &QName::new("config")).unwrap();
        tree.create_element(config, &QName::new("name")).unwrap();
        let version = tree.create_element(config, &QName::new("version")).unwrap();
        tree.set_text(version, "1.0").unwrap();
        assert_eq!(
            tree.to_value(),
            json!({"config": {"name": "", "version": "1.0"}})
        );

        let err = tree.create_element(version, &QName::new("x")).unwrap_err();
        assert_eq!(err.to_string(), "Illegal tree operation: cannot add child to a primitive value");
        assert!(tree.set_text(config, "x").is_err());
    }

    #[test]
    fn test_prepend_copy_makes_an_array() {
        let mut tree = JsonTree::from_value(json!({"a": {"b": {"c": 1}}})).unwrap();
        let a = child(&tree, tree.root(), "a");
        let b = child(&tree, a, "b");
        tree.prepend_copy(b).unwrap();
        assert_eq!(tree.to_value(), json!({"a": {"b": [{"c": 1}, {"c": 1}]}}));

        tree.remove(b).unwrap();
        assert_eq!(tree.to_value(), json!({"a": {"b": [{"c": 1}]}}));
        assert!(tree.remove(tree.root()).is_err());
    }

    #[test]
    fn test_fill_reports_stale_nodes() {
        let mut tree = JsonTree::from_value(json!({"a": {"b": 1}})).unwrap();
        let a = child(&tree, tree.root(), "a");
        tree.remove(a).unwrap();

        let err = tree.fill(a, json!({"c": 2})).unwrap_err();
        assert!(matches!(err, TreeError::StaleHandle(id) if id == a));
        assert!(tree.fill(a, json!(3)).is_err());
        assert_eq!(tree.to_value(), json!({}));
    }

    #[test]
    fn test_custom_attribute_prefix() {
        let tree = JsonTree::with_attribute_prefix(json!({"_id": 1, "@id": 2}), "_").unwrap();
        let attrs: Vec<_> = tree.attributes_of(tree.root()).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(tree.text(attrs[0]), "1");
        assert_eq!(tree.into_value(), json!({"_id": 1, "@id": 2}));
    }
}
