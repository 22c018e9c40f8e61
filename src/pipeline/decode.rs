//! Turns raw response bodies into typed values.
//!
//! Decoding is pure: no I/O and no retries, since retrying cannot fix a shape
//! mismatch. Unknown properties are ignored and optional ones default, as serde
//! does for the models in [`crate::types`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult},
    pipeline::RawResponse,
};

/// Decodes the whole body. An empty body (204) decodes as JSON `null`, so `()` and
/// `Option<T>` targets accept it.
pub fn decode<T: DeserializeOwned>(raw: &RawResponse) -> ApiResult<T> {
    decode_str(raw.body())
}

/// [`decode`] on a bare string.
pub fn decode_str<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let body = body.trim();
    let body = if body.is_empty() { "null" } else { body };
    serde_json::from_str(body)
        .map_err(|e| ApiError::decode(format!("cannot decode response body: {e}")))
}

/// Decodes the value of the top-level `property`, e.g. the list under `devices` in
/// `{ "devices": [...] }`.
///
/// A missing or `null` property yields `T::default()`: absent nested collections
/// are a normal response shape, not an error.
pub fn decode_property<T: DeserializeOwned + Default>(
    raw: &RawResponse,
    property: &str,
) -> ApiResult<T> {
    let body = raw.body().trim();
    if body.is_empty() {
        return Ok(T::default());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::decode(format!("cannot decode response body: {e}")))?;
    let Value::Object(mut object) = value else {
        return Err(ApiError::decode(format!(
            "expected a JSON object holding {property:?}"
        )));
    };

    match object.remove(property) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(inner) => serde_json::from_value(inner).map_err(|e| {
            ApiError::decode(format!("cannot decode property {property:?}: {e}"))
        }),
    }
}
