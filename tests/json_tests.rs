mod common;

use common::{TestResult, init_logger};
use pathwright::{BuildError, JsonTree, PathBuilder, XPathError};
use serde_json::json;

#[test]
fn test_put_builds_nested_members() -> TestResult {
    init_logger();
    let builder = PathBuilder::new()
        .put("/config/name")?
        .put_value("/config/version", "1.0")?;

    let value = builder.build(json!({}))?;
    assert_eq!(value, json!({"config": {"name": "", "version": "1.0"}}));

    // Replaying the same effects changes nothing.
    assert_eq!(builder.build(value.clone())?, value);
    Ok(())
}

#[test]
fn test_existing_members_are_kept() -> TestResult {
    init_logger();
    let value = PathBuilder::new()
        .put_value("/config/version", 2)?
        .build(json!({"config": {"name": "app", "debug": true}}))?;
    assert_eq!(
        value,
        json!({"config": {"name": "app", "debug": true, "version": "2"}})
    );
    Ok(())
}

#[test]
fn test_array_items_are_addressed_by_position() -> TestResult {
    init_logger();
    let value = PathBuilder::new()
        .put_value("/items[2]/name", "second")?
        .put("/items[3]")?
        .build(json!({"items": [{"id": 1}, {"id": 2}]}))?;
    assert_eq!(
        value,
        json!({"items": [{"id": 1}, {"id": 2, "name": "second"}, ""]})
    );
    Ok(())
}

#[test]
fn test_positional_put_grows_an_array() -> TestResult {
    init_logger();
    let value = PathBuilder::new()
        .put_value("/list/entry[3]", "c")?
        .build(json!({}))?;
    assert_eq!(value, json!({"list": {"entry": ["", "", "c"]}}));
    Ok(())
}

#[test]
fn test_attribute_predicates_use_the_prefix() -> TestResult {
    init_logger();
    let value = PathBuilder::new()
        .put_value("/users/user[@id='7']/name", "Ada")?
        .build(json!({}))?;
    assert_eq!(value, json!({"users": {"user": {"@id": "7", "name": "Ada"}}}));
    Ok(())
}

#[test]
fn test_remove_members() -> TestResult {
    init_logger();
    let value = PathBuilder::new()
        .remove("/items[@id='1']")?
        .remove("/secret")?
        .remove("/not/there")?
        .build(json!({"items": [{"@id": "1"}, {"@id": "2"}], "secret": "x", "keep": 1}))?;
    assert_eq!(value, json!({"items": [{"@id": "2"}], "keep": 1}));
    Ok(())
}

#[test]
fn test_growing_a_primitive_faults() -> TestResult {
    init_logger();
    let mut value = json!({"a": 1});
    let err = PathBuilder::new()
        .put("/b")?
        .put("/a/c")?
        .apply(&mut value)
        .unwrap_err();
    assert!(matches!(err, BuildError::XPath(XPathError::Navigator(_))));
    // Effects before the fault stay applied.
    assert_eq!(value, json!({"a": 1, "b": ""}));
    Ok(())
}

#[test]
fn test_json_tree_is_accepted_directly() -> TestResult {
    init_logger();
    let tree = PathBuilder::new()
        .put("/a/@x")?
        .build(JsonTree::default())?;
    assert_eq!(tree.into_value(), json!({"a": {"@x": ""}}));
    Ok(())
}
