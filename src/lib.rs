//! # pathwright
//!
//! Describe nodes with XPath-style paths and let the engine create whatever is
//! missing.
//!
//! ```
//! use pathwright::{PathBuilder, XmlDocument};
//!
//! let doc = PathBuilder::new()
//!     .put("/catalog/book[@id='5']")?
//!     .put_value("/catalog/book[@id='5']/title", "Dune")?
//!     .build(XmlDocument::new())?;
//! assert_eq!(
//!     doc.to_xml_string()?,
//!     r#"<catalog><book id="5"><title>Dune</title></book></catalog>"#
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The workspace is split into:
//! - **pathwright-xpath**: the expression language, read-only and greedy evaluation
//! - **pathwright-tree**: XML and JSON trees that implement `Navigator`
//! - **pathwright-core**: effects, the tree-model registry and `PathBuilder`

pub use pathwright_core::{BuildError, Effect, EngineConfig, PathBuilder, TreeModel, find_model};
pub use pathwright_tree::{JsonTree, NodeId, TreeError, XmlDocument};
pub use pathwright_xpath::{
    ExprContext, Expression, Limits, Materializer, Navigator, NavigatorError, View, XPathError, evaluate,
    parse_expression,
};

pub use serde_json;
