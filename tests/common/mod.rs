#![allow(dead_code)]

use pathwright::PathBuilder;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parse `text`, apply `builder` and serialize the result.
pub fn apply_to_xml(builder: &PathBuilder, text: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(builder.build_xml(text)?)
}

/// A catalog with two books, used by the XML read and remove tests.
pub fn catalog() -> &'static str {
    r#"<catalog><book id="1"><title>Dune</title></book><book id="2"><title>Emma</title></book></catalog>"#
}
