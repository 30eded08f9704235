//! # pathwright-core
//!
//! Turns path strings into effects and applies them to caller-supplied trees:
//! - **effect**: `Put`, `PutValue` and `Remove`, each one evaluation pass
//! - **builder**: the `PathBuilder` facade that accumulates and replays effects
//! - **registry**: the tree models a builder can apply effects to
//! - **config**: `EngineConfig`
//! - **error**: `BuildError`

pub mod builder;
pub mod config;
pub mod effect;
pub mod error;
pub mod registry;

pub use builder::PathBuilder;
pub use config::EngineConfig;
pub use effect::Effect;
pub use error::BuildError;
pub use registry::{TreeModel, find_model};
