pub mod arena;
pub mod error;
pub mod json;
pub mod xml;

pub use arena::{Arena, NodeId};
pub use error::TreeError;
pub use json::{DEFAULT_ATTRIBUTE_PREFIX, JsonContent, JsonTree};
pub use xml::{XmlData, XmlDocument};
