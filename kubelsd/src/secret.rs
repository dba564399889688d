use serde_json::{Map, Value};
use tracing::debug;

use crate::decode::decode_data;
use crate::error::{LsdError, Result};
use crate::format::Format;

/// A parsed Secret or SecretList. Keys are kept sorted.
pub type Document = Map<String, Value>;

/// Decodes `data` into `stringData` for a secret or a list of secrets.
///
/// The output is written in the format of the input: JSON with four-space indentation, or
/// block YAML with a trailing newline.
pub fn transform(raw: &[u8]) -> Result<String> {
    let format = Format::detect(raw);
    debug!(%format, "detected input format");

    let document = format.parse(raw)?;
    let document = dispatch(document)?;
    format.serialize(&document)
}

fn dispatch(mut document: Document) -> Result<Document> {
    match document.get_mut("items") {
        Some(Value::Array(items)) => string_data_items(items)?,
        Some(Value::Null) | None => return string_data(document),
        Some(other) => {
            return Err(LsdError::Shape(format!(
                "items must be a list, found {}",
                kind(other)
            )))
        }
    }
    Ok(document)
}

fn string_data_items(items: &mut [Value]) -> Result<()> {
    debug!(count = items.len(), "decoding secret list");
    for (index, item) in items.iter_mut().enumerate() {
        match item {
            Value::Object(secret) => *secret = string_data(std::mem::take(secret))?,
            other => {
                return Err(LsdError::Shape(format!(
                    "items[{index}] must be an object, found {}",
                    kind(other)
                )))
            }
        }
    }
    Ok(())
}

/// Replaces a non-empty `data` mapping with its decoded `stringData`.
///
/// A secret without `data`, or whose `data` is empty or not a mapping, is returned as is.
pub fn string_data(mut secret: Document) -> Result<Document> {
    let decoded = match secret.get("data") {
        Some(Value::Object(data)) if !data.is_empty() => decode_data(data)?,
        _ => return Ok(secret),
    };
    secret.remove("data");
    secret.insert("stringData".to_owned(), Value::Object(decoded));
    Ok(secret)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn replaces_data_with_string_data() {
        let secret = document(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "data": { "password": "c2VjcmV0" },
            "type": "Opaque",
        }));
        let out = string_data(secret).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "stringData": { "password": "secret" },
                "type": "Opaque",
            })
        );
    }

    #[test]
    fn leaves_secret_without_data_alone() {
        for secret in [
            json!({ "kind": "Secret" }),
            json!({ "kind": "Secret", "data": {} }),
            json!({ "kind": "Secret", "data": null }),
            json!({ "kind": "Secret", "data": "c2VjcmV0" }),
        ] {
            let out = string_data(document(secret.clone())).unwrap();
            assert_eq!(Value::Object(out), secret);
        }
    }

    #[test]
    fn decoded_data_wins_over_existing_string_data() {
        let secret = document(json!({
            "data": { "password": "c2VjcmV0" },
            "stringData": { "user": "admin" },
        }));
        let out = string_data(secret).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({ "stringData": { "password": "secret" } })
        );
    }

    #[test]
    fn dispatches_each_list_item() {
        let list = document(json!({
            "kind": "List",
            "items": [
                { "data": { "a": "c2VjcmV0" } },
                { "metadata": { "name": "empty" } },
            ],
        }));
        let out = dispatch(list).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({
                "kind": "List",
                "items": [
                    { "stringData": { "a": "secret" } },
                    { "metadata": { "name": "empty" } },
                ],
            })
        );
    }

    #[test]
    fn list_wrapper_data_is_not_decoded() {
        let list = document(json!({ "items": [], "data": { "a": "c2VjcmV0" } }));
        let out = dispatch(list.clone()).unwrap();
        assert_eq!(out, list);
    }

    #[test]
    fn null_items_means_single_secret() {
        let secret = document(json!({ "items": null, "data": { "a": "c2VjcmV0" } }));
        let out = dispatch(secret).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({ "items": null, "stringData": { "a": "secret" } })
        );
    }

    #[test]
    fn rejects_malformed_items() {
        let err = dispatch(document(json!({ "items": "nope" }))).unwrap_err();
        assert!(matches!(err, LsdError::Shape(_)), "{err:?}");

        let err = dispatch(document(json!({ "items": [{}, 3] }))).unwrap_err();
        match err {
            LsdError::Shape(msg) => assert!(msg.contains("items[1]"), "{msg}"),
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn type_error_inside_list_item() {
        let list = document(json!({ "items": [{ "data": { "port": 443 } }] }));
        match dispatch(list) {
            Err(LsdError::Type { key }) => assert_eq!(key, "port"),
            other => panic!("expected type error, got {other:?}"),
        }
    }
}
