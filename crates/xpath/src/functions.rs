//! The predicate function library.
//!
//! Calls are checked against [`SIGNATURES`] when a path is parsed, so evaluation
//! never meets an unknown function or a wrong argument count.

use crate::ast::{Expression, LocationPath};
use crate::context::ExprContext;
use crate::engine::evaluate;
use crate::error::XPathError;
use crate::navigator::Navigator;
use crate::view::View;

/// Name, minimum and maximum (`None` = variadic) argument counts.
pub const SIGNATURES: &[(&str, usize, Option<usize>)] = &[
    ("position", 0, Some(0)),
    ("last", 0, Some(0)),
    ("count", 1, Some(1)),
    ("not", 1, Some(1)),
    ("true", 0, Some(0)),
    ("false", 0, Some(0)),
    ("boolean", 1, Some(1)),
    ("number", 0, Some(1)),
    ("string", 0, Some(1)),
    ("name", 0, Some(1)),
    ("local-name", 0, Some(1)),
    ("string-length", 0, Some(1)),
    ("normalize-space", 0, Some(1)),
    ("contains", 2, Some(2)),
    ("starts-with", 2, Some(2)),
    ("concat", 2, None),
];

fn check_call(name: &str, arity: usize) -> Result<(), XPathError> {
    let (_, min, max) = SIGNATURES
        .iter()
        .find(|(known, _, _)| *known == name)
        .ok_or_else(|| XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown function".to_string(),
        })?;
    if arity < *min || max.is_some_and(|max| arity > max) {
        let expected = match max {
            Some(max) if max == min => format!("{}", min),
            Some(max) => format!("{} to {}", min, max),
            None => format!("at least {}", min),
        };
        return Err(XPathError::FunctionError {
            function: name.to_string(),
            message: format!("Expected {} argument(s), got {}", expected, arity),
        });
    }
    Ok(())
}

/// Checks every function call in `expr`, including those nested in predicates.
pub fn validate(expr: &Expression) -> Result<(), XPathError> {
    match expr {
        Expression::Literal(_) | Expression::Number(_) => Ok(()),
        Expression::LocationPath(path) => validate_path(path),
        Expression::FunctionCall { name, args } => {
            check_call(name, args.len())?;
            args.iter().try_for_each(validate)
        }
        Expression::BinaryOp { left, right, .. } => {
            validate(left)?;
            validate(right)
        }
        Expression::UnaryOp { expr, .. } => validate(expr),
    }
}

fn validate_path(path: &LocationPath) -> Result<(), XPathError> {
    path.steps
        .iter()
        .flat_map(|step| step.predicates.iter())
        .try_for_each(validate)
}

/// Dispatches a (validated) function call to its implementation.
pub fn evaluate_function<'n, Nav>(
    name: &str,
    args: &'n [Expression],
    nav: &'n Nav,
    ctx: ExprContext<Nav::Node>,
) -> View<'n, Nav::Node>
where
    Nav: Navigator + ?Sized,
{
    let arg = |i: usize| -> View<'n, Nav::Node> {
        match args.get(i) {
            Some(expr) => evaluate(expr, nav, ctx),
            None => View::Node(ctx.current),
        }
    };

    match name {
        "position" => View::Number(ctx.position as f64),
        "last" => View::Number(ctx.size.unwrap_or(ctx.position) as f64),
        "count" => match arg(0) {
            View::NodeSet(nodes) => View::Number(nodes.count() as f64),
            View::Node(_) => View::Number(1.0),
            _ => View::Number(f64::NAN),
        },
        "not" => View::Boolean(!arg(0).into_boolean()),
        "true" => View::Boolean(true),
        "false" => View::Boolean(false),
        "boolean" => View::Boolean(arg(0).into_boolean()),
        "number" => View::Number(arg(0).into_number(nav)),
        "string" => View::Literal(arg(0).into_string(nav)),
        "name" => View::Literal(first_name(arg(0), nav).unwrap_or_default()),
        "local-name" => View::Literal(
            first_name(arg(0), nav)
                .map(|n| match n.split_once(':') {
                    Some((_, local)) => local.to_string(),
                    None => n,
                })
                .unwrap_or_default(),
        ),
        "string-length" => View::Number(arg(0).into_string(nav).chars().count() as f64),
        "normalize-space" => View::Literal(
            arg(0)
                .into_string(nav)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        ),
        "contains" => {
            let haystack = arg(0).into_string(nav);
            View::Boolean(haystack.contains(&arg(1).into_string(nav)))
        }
        "starts-with" => {
            let haystack = arg(0).into_string(nav);
            View::Boolean(haystack.starts_with(&arg(1).into_string(nav)))
        }
        "concat" => View::Literal(
            (0..args.len())
                .map(|i| arg(i).into_string(nav))
                .collect::<String>(),
        ),
        other => {
            log::warn!("Function '{}' was not validated before evaluation", other);
            View::NodeSet(crate::view::NodeSet::empty())
        }
    }
}

fn first_name<Nav>(view: View<'_, Nav::Node>, nav: &Nav) -> Option<String>
where
    Nav: Navigator + ?Sized,
{
    let node = match view {
        View::Node(node) => Some(node),
        View::NodeSet(mut nodes) => nodes.next(),
        _ => None,
    }?;
    nav.name(node).map(str::to_string)
}
