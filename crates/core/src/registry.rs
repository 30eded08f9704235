//! The table of tree models a `PathBuilder` can apply effects to.
//!
//! A model recognises a caller's tree by its concrete type and runs effects over
//! it through a `Navigator`. The table is built once per process and read-only
//! afterwards.

use crate::config::EngineConfig;
use crate::effect::Effect;
use crate::error::BuildError;
use once_cell::sync::Lazy;
use pathwright_tree::{JsonTree, XmlDocument};
use pathwright_xpath::Navigator;
use serde_json::Value;
use std::any::Any;

pub trait TreeModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_handle(&self, tree: &dyn Any) -> bool;

    /// Replays `effects` in order. Stops at the first fault.
    fn apply(
        &self,
        tree: &mut dyn Any,
        effects: &[Effect],
        config: &EngineConfig,
    ) -> Result<(), BuildError>;
}

fn perform_all<Nav>(nav: &mut Nav, effects: &[Effect], config: &EngineConfig) -> Result<(), BuildError>
where
    Nav: Navigator + ?Sized,
{
    let limits = config.limits();
    for effect in effects {
        effect.perform(nav, limits)?;
    }
    Ok(())
}

struct XmlModel;

impl TreeModel for XmlModel {
    fn name(&self) -> &'static str {
        "xml-document"
    }

    fn can_handle(&self, tree: &dyn Any) -> bool {
        tree.is::<XmlDocument>()
    }

    fn apply(
        &self,
        tree: &mut dyn Any,
        effects: &[Effect],
        config: &EngineConfig,
    ) -> Result<(), BuildError> {
        let doc = tree
            .downcast_mut::<XmlDocument>()
            .ok_or(BuildError::UnsupportedTreeModel(self.name()))?;
        for (prefix, uri) in &config.namespaces {
            doc.bind_namespace(prefix.as_str(), uri.as_str());
        }
        perform_all(doc, effects, config)
    }
}

struct JsonTreeModel;

impl TreeModel for JsonTreeModel {
    fn name(&self) -> &'static str {
        "json-tree"
    }

    fn can_handle(&self, tree: &dyn Any) -> bool {
        tree.is::<JsonTree>()
    }

    fn apply(
        &self,
        tree: &mut dyn Any,
        effects: &[Effect],
        config: &EngineConfig,
    ) -> Result<(), BuildError> {
        let json = tree
            .downcast_mut::<JsonTree>()
            .ok_or(BuildError::UnsupportedTreeModel(self.name()))?;
        perform_all(json, effects, config)
    }
}

/// A raw `serde_json::Value`, converted to a `JsonTree` for the duration of
/// the call and written back afterwards, fault or not.
struct JsonValueModel;

impl TreeModel for JsonValueModel {
    fn name(&self) -> &'static str {
        "json-value"
    }

    fn can_handle(&self, tree: &dyn Any) -> bool {
        tree.is::<Value>()
    }

    fn apply(
        &self,
        tree: &mut dyn Any,
        effects: &[Effect],
        config: &EngineConfig,
    ) -> Result<(), BuildError> {
        let value = tree
            .downcast_mut::<Value>()
            .ok_or(BuildError::UnsupportedTreeModel(self.name()))?;
        let mut json =
            JsonTree::with_attribute_prefix(std::mem::take(value), &config.json_attribute_prefix)?;
        let result = perform_all(&mut json, effects, config);
        *value = json.into_value();
        result
    }
}

static MODELS: Lazy<Vec<Box<dyn TreeModel>>> = Lazy::new(|| {
    let models: Vec<Box<dyn TreeModel>> =
        vec![Box::new(XmlModel), Box::new(JsonTreeModel), Box::new(JsonValueModel)];
    log::debug!(
        "Registered tree models: {}",
        models.iter().map(|m| m.name()).collect::<Vec<_>>().join(", ")
    );
    models
});

pub fn models() -> &'static [Box<dyn TreeModel>] {
    MODELS.as_slice()
}

/// The first registered model that recognises `tree`.
pub fn find_model(tree: &dyn Any) -> Option<&'static dyn TreeModel> {
    models()
        .iter()
        .find(|model| model.can_handle(tree))
        .map(|model| model.as_ref())
}
