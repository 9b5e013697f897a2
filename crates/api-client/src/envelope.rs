//! Response envelope handling
//!
//! The backend answers either with the payload itself or with the payload
//! wrapped as `{"data": ...}`, sometimes with sibling fields such as tokens.
//! Both shapes are accepted: the wrapped payload is used when it decodes as
//! the expected type, otherwise the whole body is decoded. A falsy `data`
//! (`null`, `false`, `0`, `""`) does not count as a payload, so the whole
//! body is preferred in that case.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a response body, tolerating the `{data: ...}` wrapper.
///
/// An empty body decodes as JSON `null`.
///
/// # Examples
/// ```
/// use api_client::envelope::decode;
///
/// let flat: Vec<u32> = decode("[1, 2]").unwrap();
/// let wrapped: Vec<u32> = decode(r#"{"data": [1, 2]}"#).unwrap();
/// assert_eq!(flat, wrapped);
/// ```
pub fn decode<T>(body: &str) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    let trimmed = body.trim();
    let value = if trimmed.is_empty() { Value::Null } else { serde_json::from_str(trimmed)? };
    decode_value(value)
}

/// Decode an already-parsed JSON value, tolerating the `{data: ...}` wrapper.
pub fn decode_value<T>(value: Value) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    let Some(inner) = value.as_object().and_then(|object| object.get("data")) else {
        return T::deserialize(&value);
    };

    if is_falsy(inner) {
        T::deserialize(&value).or_else(|err| T::deserialize(inner).map_err(|_| err))
    } else {
        T::deserialize(inner).or_else(|_| T::deserialize(&value))
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
