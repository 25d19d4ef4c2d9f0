//! HTTP response building module
//!
//! Provides builders for the gateway's responses, decoupled from the dispatcher.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::Value;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Build a JSON response carrying the gateway's CORS headers
pub fn build_json_response(
    status: StatusCode,
    body: &Value,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let payload = Bytes::from(body.to_string());
    let content_length = payload.len();

    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .header("Content-Type", JSON_CONTENT_TYPE)
        .header("Content-Length", content_length)
        .header("Server", server_name)
        .body(Full::new(payload))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response for paths outside the endpoint
pub fn build_404_response(server_name: &str) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found" }),
        server_name,
    )
}

/// Build 413 Payload Too Large response
pub fn build_413_response(server_name: &str) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &serde_json::json!({ "error": "Payload Too Large" }),
        server_name,
    )
}

/// Build health check response
pub fn build_health_response(
    status: StatusCode,
    body: &Value,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let mut response = build_json_response(status, body, server_name);
    response
        .headers_mut()
        .insert("Cache-Control", hyper::header::HeaderValue::from_static("no-cache"));
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
