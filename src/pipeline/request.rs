use std::fmt;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
    Post,
    Delete,
}

impl Verb {
    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Put => Method::PUT,
            Verb::Post => Method::POST,
            Verb::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_method(), f)
    }
}

/// A fully validated, ready-to-send request. Cheap to clone; the dispatcher
/// replays the same descriptor on every retry.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    verb: Verb,
    url: Url,
    body: Option<Value>,
    requires_auth: bool,
}

impl RequestDescriptor {
    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Decoded value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<String> {
        query_pairs(&self.url).find_map(|(k, v)| {
            (decode_component(k) == key).then(|| decode_component(v))
        })
    }

    /// Copy of this request with `key` set to `value`, replacing an existing
    /// parameter of that name and keeping every other parameter as it was.
    pub fn with_query(&self, key: &str, value: &str) -> Self {
        let encoded = format!("{}={}", urlencoding::encode(key), urlencoding::encode(value));

        let mut replaced = false;
        let mut pairs: Vec<String> = Vec::new();
        for (k, v) in query_pairs(&self.url) {
            if decode_component(k) == key {
                if !replaced {
                    pairs.push(encoded.clone());
                    replaced = true;
                }
            } else {
                pairs.push(format!("{k}={v}"));
            }
        }
        if !replaced {
            pairs.push(encoded);
        }

        let mut url = self.url.clone();
        url.set_query(Some(&pairs.join("&")));
        Self {
            url,
            ..self.clone()
        }
    }

    /// Copy of this request without any parameter named `key`.
    pub fn without_query(&self, key: &str) -> Self {
        let kept: Vec<String> = query_pairs(&self.url)
            .filter(|(k, _)| decode_component(k) != key)
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        let mut url = self.url.clone();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&kept.join("&")));
        }
        Self {
            url,
            ..self.clone()
        }
    }
}

fn query_pairs(url: &Url) -> impl Iterator<Item = (&str, &str)> {
    url.query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// A query parameter value for [`build`].
#[derive(Debug, Clone, Copy)]
pub enum QueryValue<'a> {
    One(&'a str),
    Many(&'a [&'a str]),
}

/// Builds a descriptor in one call. Equivalent to the fluent [`RequestBuilder`].
pub fn build(
    verb: Verb,
    url: &str,
    query: &[(&str, QueryValue<'_>)],
    body: Option<Value>,
    requires_auth: bool,
) -> ApiResult<RequestDescriptor> {
    let mut builder = RequestBuilder::new(verb, url, "");
    for (key, value) in query {
        builder = match value {
            QueryValue::One(v) => builder.query(key, v),
            QueryValue::Many(vs) => builder.query_csv(key, vs),
        };
    }
    builder.body = body;
    builder.requires_auth = requires_auth;
    builder.build()
}

/// Fluent construction of a [`RequestDescriptor`].
///
/// Validation helpers record the first violation instead of failing immediately so
/// wrappers can chain calls; [`RequestBuilder::build`] reports it. Nothing here
/// performs I/O.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    verb: Verb,
    base_url: String,
    path: String,
    query: Vec<String>,
    body: Option<Value>,
    requires_auth: bool,
    violation: Option<ApiError>,
}

impl RequestBuilder {
    /// `path` is appended to `base_url`; path segments built from caller input
    /// must already be percent-encoded.
    pub fn new(verb: Verb, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb,
            base_url: base_url.into(),
            path: path.into(),
            query: Vec::new(),
            body: None,
            requires_auth: true,
            violation: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(&value.to_string())
        ));
        self
    }

    /// Adds the parameter only when `value` is present and not blank.
    pub fn query_opt<S: AsRef<str>>(self, key: &str, value: Option<S>) -> Self {
        match value {
            Some(v) if !v.as_ref().trim().is_empty() => self.query(key, v.as_ref()),
            _ => self,
        }
    }

    /// Adds one parameter whose value is the comma-joined list of `values`.
    /// Each element is encoded on its own so the separating commas stay literal.
    pub fn query_csv<S: AsRef<str>>(mut self, key: &str, values: &[S]) -> Self {
        let joined = values
            .iter()
            .map(|v| urlencoding::encode(v.as_ref()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        self.query
            .push(format!("{}={}", urlencoding::encode(key), joined));
        self
    }

    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(e) => self.record(ApiError::validation(format!("body is not serializable: {e}"))),
        }
        self
    }

    /// Marks the request as not requiring a credential.
    pub fn anonymous(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Requires between `min` and `max` (inclusive) non-blank ids.
    pub fn require_ids<S: AsRef<str>>(mut self, name: &str, ids: &[S], min: usize, max: usize) -> Self {
        if ids.len() < min || ids.len() > max {
            self.record(ApiError::validation(format!(
                "A minimum of {min} and a maximum of {max} {name} can be sent, got {}.",
                ids.len()
            )));
        } else if ids.iter().any(|id| id.as_ref().trim().is_empty()) {
            self.record(ApiError::validation(format!("{name} must not contain blank values.")));
        }
        self
    }

    pub fn require_range(mut self, name: &str, value: i64, min: i64, max: i64) -> Self {
        if value < min || value > max {
            self.record(ApiError::validation(format!(
                "The {name} can be a minimum of {min} and a maximum of {max}, got {value}."
            )));
        }
        self
    }

    pub fn require_non_blank(mut self, name: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.record(ApiError::validation(format!("A valid {name} has to be supplied.")));
        }
        self
    }

    fn record(&mut self, err: ApiError) {
        if self.violation.is_none() {
            self.violation = Some(err);
        }
    }

    pub fn build(self) -> ApiResult<RequestDescriptor> {
        if let Some(violation) = self.violation {
            return Err(violation);
        }
        if self.verb == Verb::Get && self.body.is_some() {
            return Err(ApiError::validation("a GET request cannot carry a body"));
        }

        let raw = if self.path.is_empty() {
            self.base_url.clone()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                self.path.trim_start_matches('/')
            )
        };
        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::validation(format!("invalid request url {raw:?}: {e}")))?;
        if !self.query.is_empty() {
            url.set_query(Some(&self.query.join("&")));
        }

        Ok(RequestDescriptor {
            verb: self.verb,
            url,
            body: self.body,
            requires_auth: self.requires_auth,
        })
    }
}
