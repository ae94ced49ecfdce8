//! JSON export writer.
//!
//! Streams rows as a single JSON array, one object per line:
//!
//! ```text
//! [
//! {"title":"a","author__username":"ann"},
//! {"title":"b","author__username":"bob"}
//! ]
//! ```

use std::io::Write;

use crate::error::Error;
use crate::query::Projection;
use crate::value::{Row, Value};

/// Write `rows` as a JSON array keyed by the projection's labels, in projection order.
///
/// Columns missing from a row are written as null. Returns the number of rows written.
pub fn write_json<W: Write>(
    mut writer: W,
    projection: &Projection,
    rows: &[Row],
) -> Result<usize, Error> {
    writer.write_all(b"[\n")?;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",\n")?;
        }
        let object: Row = projection
            .labels()
            .map(|label| {
                let value = row.get(label).cloned().unwrap_or(Value::Null);
                (label.to_string(), value)
            })
            .collect();
        serde_json::to_writer(&mut writer, &object)?;
    }
    writer.write_all(b"\n]")?;
    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use serde_json::Value as JsonValue;

    use super::*;
    use crate::catalog::{FieldDef, ModelDef, ScalarType, Schema};

    fn projection() -> Projection {
        let user = ModelDef::new("User", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::scalar("username", ScalarType::String));
        let post = ModelDef::new("Post", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int))
            .with_field(FieldDef::scalar("title", ScalarType::String))
            .with_field(FieldDef::foreign_key("author", "User"));
        let schema = Schema::new(vec![user, post]).unwrap();
        Projection::build(&schema, "Post", ["title", "author__username"]).unwrap()
    }

    #[test]
    fn test_array_layout() {
        let rows = vec![
            Row::new().with("title", "a").with("author__username", "ann"),
            Row::new().with("title", "b"),
        ];
        let mut out = Vec::new();
        assert_eq!(write_json(&mut out, &projection(), &rows).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "[\n{\"title\":\"a\",\"author__username\":\"ann\"},\n{\"title\":\"b\",\"author__username\":null}\n]"
        );
        let parsed: JsonValue = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_empty_export_is_valid_json() {
        let mut out = Vec::new();
        write_json(&mut out, &projection(), &[]).unwrap();
        assert_eq!(out, b"[\n\n]");
        let parsed: JsonValue = serde_json::from_slice(&out).unwrap();
        assert!(parsed.as_array().unwrap().is_empty());
    }
}
