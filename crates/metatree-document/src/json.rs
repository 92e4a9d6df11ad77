//! Bridge between JSON values and documents.
//!
//! Ingest accepts integers, strings, arrays and objects; anything else has no
//! document representation. Export renders raw bytes as standard base64, so it
//! is meant for display and tooling rather than a lossless round trip.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::ShapeError;
use crate::value::{Document, Scalar};

impl Document {
    /// Convert a JSON value, keeping object key order.
    ///
    /// # Errors
    ///
    /// Returns a [`ShapeError`] naming the first `null`, boolean or
    /// non-integer number encountered.
    pub fn from_json(value: &Value) -> Result<Self, ShapeError> {
        from_json_at(value, &mut String::new())
    }
}

fn from_json_at(value: &Value, path: &mut String) -> Result<Document, ShapeError> {
    match value {
        Value::Null => Err(shape_error(path, "null")),
        Value::Bool(_) => Err(shape_error(path, "boolean")),
        Value::Number(number) => number
            .as_i64()
            .map(Document::from)
            .ok_or_else(|| shape_error(path, "float")),
        Value::String(text) => Ok(Document::from(text.as_str())),
        Value::Array(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let mark = path.len();
                path.push('/');
                path.push_str(&index.to_string());
                converted.push(from_json_at(item, path)?);
                path.truncate(mark);
            }
            Ok(Document::List(converted))
        }
        Value::Object(entries) => {
            let mut converted = IndexMap::with_capacity(entries.len());
            for (key, item) in entries {
                let mark = path.len();
                path.push('/');
                path.push_str(key);
                converted.insert(key.clone(), from_json_at(item, path)?);
                path.truncate(mark);
            }
            Ok(Document::Dict(converted))
        }
    }
}

fn shape_error(path: &str, found: &'static str) -> ShapeError {
    ShapeError {
        path: path.to_string(),
        found,
    }
}

/// Render a document as JSON for display or export.
#[must_use]
pub fn to_json(document: &Document) -> Value {
    match document {
        Document::Scalar(Scalar::Integer(value)) => Value::from(*value),
        Document::Scalar(Scalar::Text(text)) => Value::String(text.clone()),
        Document::Scalar(Scalar::Bytes(bytes)) => Value::String(STANDARD.encode(bytes)),
        Document::List(items) => Value::Array(items.iter().map(to_json).collect()),
        Document::Dict(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key.clone(), to_json(value));
            }
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_supported_shapes_in_order() {
        let value = json!({"name": "x", "files": [{"length": 10}], "empty": {}});
        let document = Document::from_json(&value).expect("supported");
        let keys: Vec<_> = document.as_dict().expect("dict").keys().cloned().collect();
        assert_eq!(keys, vec!["name", "files", "empty"]);
        assert_eq!(document.get("empty"), Some(&Document::dict::<String, _>([])));
    }

    #[test]
    fn reports_path_of_unsupported_value() {
        let value = json!({"info": {"files": [{"length": 1.5}]}});
        let err = Document::from_json(&value).expect_err("float rejected");
        assert_eq!(err.path, "/info/files/0/length");
        assert_eq!(err.found, "float");

        let err = Document::from_json(&json!(null)).expect_err("null rejected");
        assert_eq!(err.path, "");
        assert_eq!(err.found, "null");
    }

    #[test]
    fn exports_bytes_as_base64() {
        let document = Document::dict([("pieces", Document::from(vec![0xff_u8, 0x00]))]);
        assert_eq!(to_json(&document), json!({"pieces": "/wA="}));
    }
}
