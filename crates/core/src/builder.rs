use crate::config::EngineConfig;
use crate::effect::Effect;
use crate::error::BuildError;
use crate::registry;
use pathwright_tree::XmlDocument;
use pathwright_xpath::parse_expression;
use std::any::{Any, type_name};

/// Accumulates paths (and values) and applies them, in order, to a tree.
///
/// Paths are parsed as they are added, so a malformed path is reported before
/// any tree is touched.
///
/// ```
/// use pathwright_core::PathBuilder;
/// use serde_json::json;
///
/// let tree = PathBuilder::new()
///     .put("/config/name")?
///     .put_value("/config/version", "1.0")?
///     .build(json!({}))?;
/// assert_eq!(tree, json!({"config": {"name": "", "version": "1.0"}}));
/// # Ok::<(), pathwright_core::BuildError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    effects: Vec<Effect>,
    config: EngineConfig,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            effects: Vec::new(),
            config,
        }
    }

    /// Binds a namespace prefix used in paths to its URI.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.config.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Makes sure the nodes `path` describes exist.
    pub fn put(mut self, path: &str) -> Result<Self, BuildError> {
        self.effects.push(Effect::Put(parse_expression(path)?));
        Ok(self)
    }

    /// Makes sure the nodes `path` describes exist and sets their text.
    pub fn put_value(mut self, path: &str, value: impl ToString) -> Result<Self, BuildError> {
        self.effects
            .push(Effect::PutValue(parse_expression(path)?, value.to_string()));
        Ok(self)
    }

    /// Detaches whatever `path` selects. A path that selects nothing is fine.
    pub fn remove(mut self, path: &str) -> Result<Self, BuildError> {
        self.effects.push(Effect::Remove(parse_expression(path)?));
        Ok(self)
    }

    /// Applies every effect to `tree` in place.
    pub fn apply<T: Any>(&self, tree: &mut T) -> Result<(), BuildError> {
        let model = registry::find_model(&*tree)
            .ok_or(BuildError::UnsupportedTreeModel(type_name::<T>()))?;
        log::debug!(
            "Applying {} effect(s) to a {} tree",
            self.effects.len(),
            model.name()
        );
        model.apply(tree, &self.effects, &self.config)
    }

    /// Applies every effect to `tree` and hands it back.
    pub fn build<T: Any>(&self, mut tree: T) -> Result<T, BuildError> {
        self.apply(&mut tree)?;
        Ok(tree)
    }

    /// Parses `xml`, applies every effect and serializes the result.
    pub fn build_xml(&self, xml: &str) -> Result<String, BuildError> {
        let doc = self.build(XmlDocument::parse(xml)?)?;
        Ok(doc.to_xml_string()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathwright_tree::TreeError;
    use pathwright_xpath::XPathError;
    use serde_json::json;

    #[test]
    fn test_effects_are_parsed_on_accumulation() {
        let builder = PathBuilder::new()
            .put("/a")
            .and_then(|b| b.put_value("/a/b", 42))
            .and_then(|b| b.remove("/a/c"))
            .unwrap();
        assert_eq!(builder.effects().len(), 3);
        assert!(matches!(&builder.effects()[1], Effect::PutValue(_, v) if v == "42"));

        let err = PathBuilder::new().put("/a[").unwrap_err();
        assert!(matches!(err, BuildError::XPath(XPathError::XPathParse(..))));
    }

    #[test]
    fn test_unsupported_tree_model() {
        let err = PathBuilder::new().put("/a").unwrap().build(vec![1, 2]).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedTreeModel(name) if name.contains("Vec")));
    }

    #[test]
    fn test_build_xml() {
        let builder = PathBuilder::new().put_value("/a/b", "1").unwrap();
        assert_eq!(builder.build_xml("<a/>").unwrap(), "<a><b>1</b></a>");
        let err = builder.build_xml("<a>").unwrap_err();
        assert!(matches!(err, BuildError::Tree(TreeError::XmlParse(_))));
    }

    #[test]
    fn test_namespace_bindings() {
        let builder = PathBuilder::new()
            .with_namespace("dc", "urn:dc")
            .put_value("/record/dc:title", "Dune")
            .unwrap();
        assert_eq!(
            builder.build_xml("<record/>").unwrap(),
            r#"<record><dc:title xmlns:dc="urn:dc">Dune</dc:title></record>"#
        );
        // An existing declaration under another prefix is matched by URI.
        assert_eq!(
            builder
                .build_xml(r#"<record xmlns:t="urn:dc"><t:title/></record>"#)
                .unwrap(),
            r#"<record xmlns:t="urn:dc"><t:title>Dune</t:title></record>"#
        );

        let err = PathBuilder::new().put("/r/p:a").unwrap().build_xml("<r/>").unwrap_err();
        assert!(matches!(err, BuildError::XPath(XPathError::Navigator(_))));
    }

    #[test]
    fn test_config_reaches_the_engine() {
        let config = EngineConfig {
            max_position: 3,
            json_attribute_prefix: "_".into(),
            ..EngineConfig::default()
        };
        let builder = PathBuilder::with_config(config).put("/a[@id='x']").unwrap();
        assert_eq!(builder.build(json!({})).unwrap(), json!({"a": {"_id": "x"}}));

        let err = builder.clone().put("/a/b[4]").unwrap().build(json!({})).unwrap_err();
        assert!(matches!(
            err,
            BuildError::XPath(XPathError::PositionLimit { requested: 4, limit: 3 })
        ));
    }
}
