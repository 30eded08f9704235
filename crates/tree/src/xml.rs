//! An XML document as a navigable, growable tree: parsed with roxmltree,
//! written with quick-xml.
//!
//! Prefixed names are resolved against the namespace declarations in scope.
//! Prefixes a path uses but the document never declares can be bound with
//! [`XmlDocument::bind_namespace`]; creating a node with such a prefix declares
//! it on the way.

use crate::arena::{Arena, NodeId};
use crate::error::TreeError;
use pathwright_xpath::{Navigator, NavigatorError, QName};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// What a node of an [`XmlDocument`] is.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlData {
    Document,
    Element {
        name: String,
        /// Namespace declarations made on this element (`None` = default).
        namespaces: Vec<(Option<String>, String)>,
    },
    Attribute {
        name: String,
        value: String,
    },
    Text(String),
}

/// A mutable XML document of document, element, attribute and text nodes.
///
/// Comments and processing instructions are dropped on parse.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    arena: Arena<XmlData>,
    root: NodeId,
    /// Prefix to URI bindings for paths, consulted after the document's own
    /// declarations.
    bindings: Vec<(String, String)>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// An empty document with no document element yet.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(XmlData::Document, None);
        Self {
            arena,
            root,
            bindings: Vec::new(),
        }
    }

    /// Binds `prefix` to `uri` for name tests and node creation. A later
    /// binding of the same prefix replaces the earlier one.
    pub fn bind_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let (prefix, uri) = (prefix.into(), uri.into());
        match self.bindings.iter_mut().find(|(p, _)| *p == prefix) {
            Some(binding) => binding.1 = uri,
            None => self.bindings.push((prefix, uri)),
        }
    }

    fn binding(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// The URI `prefix` (`None` for the default namespace) resolves to at
    /// `from`, looking at `from` and its ancestors.
    fn in_scope(&self, from: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        let mut current = Some(from);
        while let Some(id) = current {
            let entry = self.arena.get(id)?;
            if let XmlData::Element { namespaces, .. } = &entry.data {
                if let Some((_, uri)) = namespaces.iter().find(|(p, _)| p.as_deref() == prefix) {
                    return Some(uri.as_str()).filter(|uri| !uri.is_empty());
                }
            }
            current = entry.parent;
        }
        None
    }

    /// The declaration a new node named `name` needs under `parent`, if any.
    /// Faults for a prefix that is neither in scope nor bound.
    fn declaration_for(
        &self,
        parent: NodeId,
        name: &QName,
    ) -> Result<Option<(Option<String>, String)>, TreeError> {
        let Some(prefix) = name.prefix.as_deref() else {
            return Ok(None);
        };
        if self.in_scope(parent, Some(prefix)).is_some() {
            return Ok(None);
        }
        match self.binding(prefix) {
            Some(uri) => Ok(Some((Some(prefix.to_string()), uri.to_string()))),
            None => Err(TreeError::illegal(format!(
                "namespace prefix '{}' is not declared or bound",
                prefix
            ))),
        }
    }

    pub fn parse(text: &str) -> Result<Self, TreeError> {
        let source = roxmltree::Document::parse(text)?;
        let mut doc = Self::new();
        let root = doc.root;
        for child in source.root().children() {
            doc.import(child, root)?;
        }
        Ok(doc)
    }

    fn import(&mut self, node: roxmltree::Node<'_, '_>, parent: NodeId) -> Result<(), TreeError> {
        if node.is_text() {
            let text = node.text().unwrap_or_default().to_string();
            self.arena.append_child(parent, XmlData::Text(text))?;
            return Ok(());
        }
        if !node.is_element() {
            return Ok(());
        }

        let tag = node.tag_name();
        let name = qualify(node, tag.namespace(), tag.name());
        let inherited: Vec<_> = node
            .parent_element()
            .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
            .unwrap_or_default();
        let namespaces = node
            .namespaces()
            .filter(|ns| ns.name() != Some("xml"))
            .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
            .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
            .collect();
        let id = self
            .arena
            .append_child(parent, XmlData::Element { name, namespaces })?;

        for attr in node.attributes() {
            let data = XmlData::Attribute {
                name: qualify(node, attr.namespace(), attr.name()),
                value: attr.value().to_string(),
            };
            self.arena.append_attribute(id, data)?;
        }
        for child in node.children() {
            self.import(child, id)?;
        }
        Ok(())
    }

    /// Serializes the document without an XML declaration.
    pub fn to_xml_string(&self) -> Result<String, TreeError> {
        let mut writer = Writer::new(Vec::new());
        for &child in &self.arena.entry(self.root)?.children {
            self.write_node(&mut writer, child)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), TreeError> {
        let entry = self.arena.entry(id)?;
        match &entry.data {
            XmlData::Element { name, namespaces } => {
                let mut start = BytesStart::new(name.as_str());
                for (prefix, uri) in namespaces {
                    let key = match prefix {
                        Some(prefix) => format!("xmlns:{}", prefix),
                        None => "xmlns".to_string(),
                    };
                    start.push_attribute((key.as_str(), uri.as_str()));
                }
                for &attr in &entry.attributes {
                    if let XmlData::Attribute { name, value } = &self.arena.entry(attr)?.data {
                        start.push_attribute((name.as_str(), value.as_str()));
                    }
                }
                if entry.children.is_empty() {
                    emit(writer, Event::Empty(start))?;
                } else {
                    emit(writer, Event::Start(start))?;
                    for &child in &entry.children {
                        self.write_node(writer, child)?;
                    }
                    emit(writer, Event::End(BytesEnd::new(name.as_str())))?;
                }
            }
            XmlData::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
            XmlData::Document | XmlData::Attribute { .. } => {}
        }
        Ok(())
    }

    /// Number of live nodes, the document node included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    fn data(&self, id: NodeId) -> Option<&XmlData> {
        self.arena.get(id).map(|entry| &entry.data)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(entry) = self.arena.get(id) else {
            return;
        };
        match &entry.data {
            XmlData::Text(text) => out.push_str(text),
            XmlData::Attribute { value, .. } => out.push_str(value),
            XmlData::Document | XmlData::Element { .. } => {
                for &child in &entry.children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), TreeError> {
    writer
        .write_event(event)
        .map_err(|e| TreeError::XmlWrite(e.to_string()))
}

/// Rebuilds `prefix:local` from a namespace URI, since roxmltree resolves
/// prefixes away.
fn qualify(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(XML_NAMESPACE) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

impl Navigator for XmlDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|entry| entry.parent)
    }

    fn elements_of(&self, node: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        match self.arena.get(node) {
            Some(entry) => Box::new(
                entry
                    .children
                    .iter()
                    .copied()
                    .filter(|&child| matches!(self.data(child), Some(XmlData::Element { .. }))),
            ),
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
        match self.data(node)? {
            XmlData::Element { name, .. } | XmlData::Attribute { name, .. } => Some(name),
            XmlData::Document | XmlData::Text(_) => None,
        }
    }

    fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.binding(prefix).or_else(|| {
            let element = self.elements_of(self.root).next()?;
            self.in_scope(element, Some(prefix))
        })
    }

    fn namespace_uri(&self, node: NodeId) -> Option<&str> {
        let entry = self.arena.get(node)?;
        match &entry.data {
            XmlData::Element { name, .. } => {
                self.in_scope(node, name.split_once(':').map(|(prefix, _)| prefix))
            }
            // Unprefixed attributes are in no namespace.
            XmlData::Attribute { name, .. } => {
                let (prefix, _) = name.split_once(':')?;
                self.in_scope(entry.parent?, Some(prefix))
            }
            XmlData::Document | XmlData::Text(_) => None,
        }
    }

    fn create_element(&mut self, parent: NodeId, name: &QName) -> Result<NodeId, NavigatorError> {
        match self.arena.entry(parent)?.data {
            XmlData::Element { .. } => {}
            XmlData::Document => {
                if self.elements_of(parent).next().is_some() {
                    return Err(TreeError::illegal("the document already has a root element").into());
                }
            }
            _ => return Err(TreeError::illegal("only documents and elements can hold elements").into()),
        }
        let data = XmlData::Element {
            name: name.to_string(),
            namespaces: self.declaration_for(parent, name)?.into_iter().collect(),
        };
        let id = self.arena.append_child(parent, data)?;
        log::trace!("Created element <{}>", name);
        Ok(id)
    }

    fn create_attribute(&mut self, parent: NodeId, name: &QName) -> Result<NodeId, NavigatorError> {
        if !matches!(self.arena.entry(parent)?.data, XmlData::Element { .. }) {
            return Err(TreeError::illegal("only elements can hold attributes").into());
        }
        if let Some(declaration) = self.declaration_for(parent, name)? {
            if let XmlData::Element { namespaces, .. } = &mut self.arena.entry_mut(parent)?.data {
                namespaces.push(declaration);
            }
        }
        let data = XmlData::Attribute {
            name: name.to_string(),
            value: String::new(),
        };
        Ok(self.arena.append_attribute(parent, data)?)
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), NavigatorError> {
        match &mut self.arena.entry_mut(node)?.data {
            XmlData::Attribute { value, .. } => *value = text.to_string(),
            XmlData::Text(content) => *content = text.to_string(),
            XmlData::Element { .. } => {
                self.arena.clear_children(node)?;
                if !text.is_empty() {
                    self.arena.append_child(node, XmlData::Text(text.to_string()))?;
                }
            }
            XmlData::Document => return Err(TreeError::illegal("cannot set text on the document").into()),
        }
        Ok(())
    }

    fn prepend_copy(&mut self, node: NodeId) -> Result<NodeId, NavigatorError> {
        if self.parent_of(node) == Some(self.root) {
            return Err(TreeError::illegal("cannot duplicate the document element").into());
        }
        Ok(self.arena.copy_before(node)?)
    }

    fn remove(&mut self, node: NodeId) -> Result<(), NavigatorError> {
        Ok(self.arena.detach(node)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathwright_xpath::{ExprContext, evaluate, parse_expression};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn select(doc: &XmlDocument, path: &str) -> Vec<NodeId> {
        init_logger();
        let expr = parse_expression(path).unwrap();
        let nodes = evaluate(&expr, doc, ExprContext::new(doc.root()))
            .into_nodes()
            .unwrap()
            .collect();
        nodes
    }

    #[test]
    fn test_parse_and_navigate() {
        init_logger();
        let doc = XmlDocument::parse(r#"<a x="1"><b>one</b><c/><b>two</b></a>"#).unwrap();
        assert_eq!(select(&doc, "/a/b").len(), 2);
        let b2 = select(&doc, "/a/b[2]")[0];
        assert_eq!(doc.text(b2), "two");
        let x = select(&doc, "/a/@x")[0];
        assert_eq!(doc.name(x), Some("x"));
        assert_eq!(doc.text(x), "1");
        let a = select(&doc, "/a")[0];
        assert_eq!(doc.text(a), "onetwo");
        assert_eq!(doc.parent_of(a), Some(doc.root()));
    }

    #[test]
    fn test_round_trip_keeps_prefixes_and_escapes() {
        let text = r#"<r xmlns:p="urn:p"><p:item xml:lang="en" k="a&amp;b">1 &lt; 2</p:item></r>"#;
        let doc = XmlDocument::parse(text).unwrap();
        assert_eq!(select(&doc, "/r/p:item/@xml:lang").len(), 1);
        assert_eq!(doc.to_xml_string().unwrap(), text);
    }

    #[test]
    fn test_set_text_replaces_children() {
        let mut doc = XmlDocument::parse("<a><b><c/></b></a>").unwrap();
        let b = select(&doc, "/a/b")[0];
        let c = select(&doc, "/a/b/c")[0];
        doc.set_text(b, "hi").unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), "<a><b>hi</b></a>");
        assert!(doc.elements_of(b).next().is_none());
        // Handles into the replaced subtree are stale now.
        assert_eq!(doc.text(c), "");
        assert!(doc.set_text(c, "x").is_err());
    }

    #[test]
    fn test_mutation_faults() {
        let mut doc = XmlDocument::new();
        let root = doc.root();
        let a = doc.create_element(root, &QName::new("a")).unwrap();
        assert!(doc.create_element(root, &QName::new("b")).is_err());
        assert!(doc.create_attribute(root, &QName::new("x")).is_err());
        assert!(doc.prepend_copy(a).is_err());
        assert!(doc.remove(root).is_err());
        assert!(doc.set_text(root, "x").is_err());

        let x = doc.create_attribute(a, &QName::new("x")).unwrap();
        assert!(doc.create_element(x, &QName::new("y")).is_err());
    }

    #[test]
    fn test_names_match_by_namespace() {
        let mut doc =
            XmlDocument::parse(r#"<r xmlns:y="urn:x" xmlns="urn:d"><y:item/><item/></r>"#).unwrap();
        assert_eq!(select(&doc, "/r/y:item").len(), 1);
        // `x` is not declared, so it only matches literally until bound.
        assert!(select(&doc, "/r/x:item").is_empty());
        doc.bind_namespace("x", "urn:x");
        assert_eq!(select(&doc, "/r/x:item"), select(&doc, "/r/y:item"));
        doc.bind_namespace("d", "urn:d");
        assert_eq!(select(&doc, "/d:r/d:item").len(), 1);
        assert_eq!(select(&doc, "/r/item").len(), 1);
    }

    #[test]
    fn test_created_prefixes_are_declared() {
        let mut doc = XmlDocument::new();
        let root = doc.root();
        let err = doc.create_element(root, &QName::parse("p:a")).unwrap_err();
        assert!(err.to_string().contains("namespace prefix 'p'"));

        doc.bind_namespace("p", "urn:p");
        let a = doc.create_element(root, &QName::parse("p:a")).unwrap();
        doc.create_element(a, &QName::parse("p:b")).unwrap();
        doc.create_attribute(a, &QName::parse("q:k")).unwrap_err();
        doc.bind_namespace("q", "urn:q");
        doc.create_attribute(a, &QName::parse("q:k")).unwrap();
        doc.create_attribute(a, &QName::parse("xml:lang")).unwrap();

        let text = doc.to_xml_string().unwrap();
        assert_eq!(
            text,
            r#"<p:a xmlns:p="urn:p" xmlns:q="urn:q" q:k="" xml:lang=""><p:b/></p:a>"#
        );
        assert_eq!(XmlDocument::parse(&text).unwrap().to_xml_string().unwrap(), text);
    }

    #[test]
    fn test_prepend_copy_and_remove() {
        let mut doc = XmlDocument::parse(r#"<a><b k="1"><c/></b></a>"#).unwrap();
        let b = select(&doc, "/a/b")[0];
        let copy = doc.prepend_copy(b).unwrap();
        assert_eq!(select(&doc, "/a/b"), vec![copy, b]);
        assert_eq!(
            doc.to_xml_string().unwrap(),
            r#"<a><b k="1"><c/></b><b k="1"><c/></b></a>"#
        );
        doc.remove(copy).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), r#"<a><b k="1"><c/></b></a>"#);
        assert!(doc.remove(copy).is_err());
    }
}
