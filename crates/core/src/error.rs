//! Defines the error type surfaced by `PathBuilder`.

use pathwright_tree::TreeError;
use pathwright_xpath::XPathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Path error: {0}")]
    XPath(#[from] XPathError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Unsupported tree model: {0}")]
    UnsupportedTreeModel(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
