use crate::arena::NodeId;
use pathwright_xpath::NavigatorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("XML writing error: {0}")]
    XmlWrite(String),

    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Stale node handle {0:?}")]
    StaleHandle(NodeId),

    #[error("The root node cannot be {0}")]
    Root(&'static str),

    #[error("Illegal tree operation: {0}")]
    Illegal(String),
}

impl TreeError {
    pub fn illegal(message: impl Into<String>) -> Self {
        TreeError::Illegal(message.into())
    }
}

impl From<TreeError> for NavigatorError {
    fn from(e: TreeError) -> Self {
        NavigatorError::with_source(e.to_string(), e)
    }
}
