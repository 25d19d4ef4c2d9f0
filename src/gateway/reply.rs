// Reply bodies
// The small status objects every client already understands

use serde::Serialize;
use serde_json::{json, Value};

use crate::store::StoreError;

pub fn success() -> Value {
    json!({ "success": true })
}

pub fn error(message: &str) -> Value {
    json!({ "error": message })
}

pub fn no_data() -> Value {
    error("No data")
}

pub fn invalid_action() -> Value {
    json!({ "message": "Invalid action" })
}

pub fn connection_failed(err: &StoreError) -> Value {
    error(&format!("Connection failed: {}", err.message()))
}

/// Serialize any read result; storage failures become `{error}`
pub fn rows<T: Serialize>(result: Result<T, StoreError>) -> Value {
    match result {
        Ok(rows) => serde_json::to_value(rows).unwrap_or_else(|e| error(&e.to_string())),
        Err(e) => error(&e.message()),
    }
}

/// Outcome of a single write statement
pub fn written(result: Result<(), StoreError>) -> Value {
    match result {
        Ok(()) => success(),
        Err(e) => error(&e.message()),
    }
}
