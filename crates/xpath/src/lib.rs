pub mod ast;
pub mod axes;
pub mod context;
pub mod engine;
pub mod error;
pub mod functions;
pub mod greedy;
pub mod iter;
pub mod navigator;
pub mod operators;
pub mod parser;
pub mod view;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, QName, Step};
pub use context::{ExprContext, Limits};
pub use engine::evaluate;
pub use greedy::Materializer;
pub use navigator::Navigator;
pub use view::{NodeSet, View};

// Re-export test utilities for integration testing in downstream crates
pub use error::{NavigatorError, XPathError};
pub use navigator::tests;
pub use parser::parse_expression;
