// src/models/json.rs
//! JSON input that keeps its exact bytes.
//!
//! Documents are signed over the bytes the caller submitted, so the parsed
//! tree is only ever read from. Nothing here re-serializes the input.

use crate::error::ModelFailure;
use serde_json::{Map, Value};

/// A parsed JSON object paired with the exact text it was parsed from.
#[derive(Debug, Clone)]
pub struct RawJson {
    raw: String,
    object: Map<String, Value>,
}

impl RawJson {
    /// Parses `input`, which must be a JSON object.
    ///
    /// # Errors
    /// `MalformedJson` if the text is not JSON, or is JSON but not an object
    pub fn parse(input: &str) -> Result<Self, ModelFailure> {
        match serde_json::from_str::<Value>(input) {
            Ok(Value::Object(object)) => Ok(RawJson {
                raw: input.to_string(),
                object,
            }),
            Ok(_) => Err(ModelFailure::MalformedJson(
                "expected a JSON object at the top level".to_string(),
            )),
            Err(e) => Err(ModelFailure::MalformedJson(e.to_string())),
        }
    }

    /// The submitted bytes, exactly as received.
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn object(&self) -> &Map<String, Value> {
        &self.object
    }

    /// Mandatory string field of the top-level object.
    pub fn string(&self, field: &str) -> Result<&str, ModelFailure> {
        required_str(&self.object, field)
    }

    /// Optional string field; present but not a string is a failure.
    pub fn optional_string(&self, field: &str) -> Result<Option<&str>, ModelFailure> {
        match self.object.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ModelFailure::MissingField(field.to_string())),
        }
    }

    /// Mandatory array field of the top-level object.
    pub fn array(&self, field: &str) -> Result<&[Value], ModelFailure> {
        match self.object.get(field) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ModelFailure::MissingField(field.to_string())),
        }
    }

    /// Optional array field; absent or `null` reads as empty.
    pub fn optional_array(&self, field: &str) -> Result<&[Value], ModelFailure> {
        match self.object.get(field) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ModelFailure::MissingField(field.to_string())),
        }
    }
}

/// Mandatory string field of an arbitrary object.
pub(crate) fn required_str<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a str, ModelFailure> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ModelFailure::MissingField(field.to_string()))
}

/// Treats an array element as an object, naming the array on failure.
pub(crate) fn as_object<'a>(
    item: &'a Value,
    array: &str,
) -> Result<&'a Map<String, Value>, ModelFailure> {
    item.as_object()
        .ok_or_else(|| ModelFailure::MissingField(format!("{array}[]")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_exact_bytes() {
        let input = "{ \"b\": 1,\n  \"a\" : \"x\" }";
        let json = RawJson::parse(input).unwrap();

        assert_eq!(json.as_bytes(), input.as_bytes());
        assert_eq!(json.string("a").unwrap(), "x");
    }

    #[test]
    fn test_rejects_non_json_and_non_objects() {
        assert!(matches!(RawJson::parse("{"), Err(ModelFailure::MalformedJson(_))));
        assert!(matches!(RawJson::parse("[1, 2]"), Err(ModelFailure::MalformedJson(_))));
        assert!(matches!(RawJson::parse(""), Err(ModelFailure::MalformedJson(_))));
    }

    #[test]
    fn test_field_accessors() {
        let json = RawJson::parse(r#"{"s": "v", "n": 3, "list": [1], "nothing": null}"#).unwrap();

        assert_eq!(json.optional_string("missing").unwrap(), None);
        assert_eq!(json.optional_string("nothing").unwrap(), None);
        assert!(json.optional_string("n").is_err());
        assert!(json.string("n").is_err());
        assert_eq!(json.array("list").unwrap().len(), 1);
        assert!(json.optional_array("missing").unwrap().is_empty());
        assert!(json.optional_array("s").is_err());
        assert_eq!(
            json.array("s"),
            Err(ModelFailure::MissingField("s".to_string()))
        );
    }
}
