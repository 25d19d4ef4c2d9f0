//! Request routing module
//!
//! Entry point for HTTP request processing: health probes, endpoint matching,
//! body limits, then hand-off to the dispatcher. Any method is accepted.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use serde_json::json;

use crate::config::AppState;
use crate::gateway::ActionRequest;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, peer_addr));

    let (response, action) = route_request(req, &state).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.action = action;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request to health probes or the dispatcher
async fn route_request<B>(
    req: Request<B>,
    state: &AppState,
) -> (Response<Full<Bytes>>, Option<String>)
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let server_name = state.config.http.server_name.as_str();
    let path = req.uri().path();

    // 0. Health check endpoints (highest priority)
    let health = &state.config.health;
    if health.enabled {
        if path == health.liveness_path {
            let body = json!({ "status": "ok" });
            return (http::build_health_response(StatusCode::OK, &body, server_name), None);
        }
        if path == health.readiness_path {
            return (check_readiness(state).await, None);
        }
    }

    // 1. Endpoint restriction
    if let Some(endpoint) = state.config.http.endpoint.as_deref() {
        if path != endpoint {
            return (http::build_404_response(server_name), None);
        }
    }

    // 2. Declared body size
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size, server_name) {
        return (resp, None);
    }

    // 3. Read the body under the same limit
    let query = req.uri().query().map(ToString::to_string);
    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_warning(&format!("Request body exceeded {limit} bytes"));
            return (http::build_413_response(server_name), None);
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Bytes::new()
        }
    };

    // 4. Dispatch
    let action_req = ActionRequest::new(query.as_deref(), &bytes);
    let value = state.gateway.dispatch(&action_req).await;
    let action = Some(action_req.action().to_string()).filter(|a| !a.is_empty());
    (http::build_json_response(StatusCode::OK, &value, server_name), action)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(
    req: &Request<B>,
    max_body_size: u64,
    server_name: &str,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response(server_name))
            }
            _ => None,
        },
    )
}

/// Readiness: one storage session must open and close
async fn check_readiness(state: &AppState) -> Response<Full<Bytes>> {
    let server_name = state.config.http.server_name.as_str();
    match state.gateway.check_storage().await {
        Ok(()) => {
            let body = json!({ "status": "ready" });
            http::build_health_response(StatusCode::OK, &body, server_name)
        }
        Err(e) => {
            logger::log_warning(&format!("Readiness check failed: {e}"));
            let body = json!({ "status": "unavailable", "error": e.message() });
            http::build_health_response(StatusCode::SERVICE_UNAVAILABLE, &body, server_name)
        }
    }
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}
