use crate::error::{Error, ModelResult};
use error_stack::{ResultExt, report};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::value::Value;
use tracing::error;

/// Converts a JSON object into a URL-encoded query string with parameters
/// sorted alphabetically by key. Sorting keeps the query string canonical,
/// so byte-equal requests correspond to value-equal request descriptors.
///
/// Null values are skipped entirely rather than serialized as "null".
pub fn value_to_sorted_querystring(value: &Value) -> ModelResult<String> {
    let mut pairs: Vec<(String, String)> = match value {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Null))
            .map(|(k, v)| {
                let value_str = match v {
                    Value::String(s) => s.to_string(),
                    _ => v.to_string(),
                };
                (k.clone(), value_str)
            })
            .collect(),
        _ => {
            return Err(report!(Error::ParseError)
                .attach_printable(format!("Invalid JSON Object: {value:?}")));
        }
    };

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<String>>()
        .join("&"))
}

/// Deserializes a successful response body, or surfaces the error body of
/// a failed one. Non-JSON success bodies are rejected.
pub async fn handle_reqwest_response<T: DeserializeOwned>(response: Response) -> ModelResult<T> {
    let response_code: u16 = response.status().as_u16();
    match response_code {
        0..=399 => {
            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("");

            // Use Json as default content type
            if content_type.contains("application/json") || content_type.is_empty() {
                response.json().await.change_context(Error::SerdeDeserialize(
                    "Failed to deserialize JSON".to_string(),
                ))
            } else {
                Err(report!(Error::ParseError)
                    .attach_printable(format!("Unsupported Content-Type: {content_type}")))
            }
        }
        _ => {
            let error_body = response.text().await.change_context(Error::ReqwestError(
                "Failed to get text from response".to_string(),
            ))?;

            error!("Error Body: {}", &error_body);

            Err(report!(Error::ReqwestError(error_body)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_sorted_querystring_success() {
        let value = json!({
            "key1": "val1",
            "key4": "val4",
            "key2": "val2",
            "key3": null,
        });

        let result = value_to_sorted_querystring(&value).unwrap();
        assert_eq!(result, "key1=val1&key2=val2&key4=val4");
    }

    #[test]
    fn test_value_to_sorted_querystring_different_types() {
        let value = json!({
            "string_key": "text_value",
            "number_key": 42,
            "bool_key": true,
        });

        let result = value_to_sorted_querystring(&value).unwrap();
        assert_eq!(result, "bool_key=true&number_key=42&string_key=text_value");
    }

    #[test]
    fn test_value_to_sorted_querystring_rejects_non_object() {
        assert!(value_to_sorted_querystring(&json!("just a string")).is_err());
        assert!(value_to_sorted_querystring(&json!([1, 2, 3])).is_err());
    }
}
