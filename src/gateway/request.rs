//! Action request decoding
//!
//! Turns the raw query string and body bytes into the values handlers read.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decoded query parameters; later duplicates win
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let params = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Lookup key value; an absent key reads as the empty string and matches nothing
    pub fn key(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }
}

/// Everything a handler may read from one HTTP request
#[derive(Debug, Clone, Default)]
pub struct ActionRequest {
    pub query: QueryParams,
    body: Option<Map<String, Value>>,
}

impl ActionRequest {
    pub fn new(query: Option<&str>, body: &[u8]) -> Self {
        Self {
            query: QueryParams::parse(query),
            body: parse_body(body),
        }
    }

    /// Name of the requested action, empty when missing
    pub fn action(&self) -> &str {
        self.query.key("action")
    }

    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Decode the body into a payload; `None` only when there is no body
    pub fn payload<T: DeserializeOwned>(&self) -> Option<T> {
        let body = self.body.as_ref()?;
        serde_json::from_value(Value::Object(body.clone())).ok()
    }
}

/// Only a non-empty JSON object counts as a body
fn parse_body(bytes: &[u8]) -> Option<Map<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}
