use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// A fault raised by a tree adapter while navigating or mutating its tree.
///
/// Adapters translate whatever their underlying tree library reports into this
/// type; the engine propagates it unchanged.
#[derive(Debug)]
pub struct NavigatorError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl NavigatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NavigatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for NavigatorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[derive(Error, Debug)]
pub enum XPathError {
    #[error("XPath parse error in '{0}': {1}")]
    XPathParse(String, String),

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Cannot write into a read-only {0} view")]
    ReadOnlyView(&'static str),

    #[error("Cannot materialize '{0}'")]
    CannotMaterialize(String),

    #[error("Position {requested} exceeds the configured limit of {limit}")]
    PositionLimit { requested: usize, limit: usize },

    #[error("Tree model error: {0}")]
    Navigator(#[from] NavigatorError),
}
