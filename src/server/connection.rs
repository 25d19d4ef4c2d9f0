// Connection handling module
// Admits TCP connections under the configured cap and serves them with hyper

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::http;
use crate::logger;

/// Holds one slot of the active connection count until dropped
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    /// Claim a slot, or `None` when `limit` connections are already open
    fn claim(counter: &Arc<AtomicUsize>, limit: Option<u64>) -> Option<Self> {
        let open = counter.fetch_add(1, Ordering::SeqCst);
        let slot = Self(Arc::clone(counter));
        match limit {
            Some(max) if open >= usize::try_from(max).unwrap_or(usize::MAX) => None,
            _ => Some(slot),
        }
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Admit a connection and spawn its task onto `tasks`.
///
/// Over `performance.max_connections` the stream is closed straight away.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    active: &Arc<AtomicUsize>,
    tasks: &mut JoinSet<()>,
) {
    let limit = state.config.performance.max_connections;
    let Some(slot) = ConnectionSlot::claim(active, limit) else {
        logger::log_warning(&format!(
            "Connection limit {} reached, rejecting {peer_addr}",
            limit.unwrap_or_default()
        ));
        return;
    };

    logger::log_connection_accepted(&peer_addr);
    tasks.spawn(serve_connection(stream, peer_addr, Arc::clone(state), slot));
}

/// Serve HTTP/1.1 on one stream until the client leaves or time runs out
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    _slot: ConnectionSlot,
) {
    let limit = Duration::from_secs(state.config.performance.request_timeout);

    let mut builder = http1::Builder::new();
    builder.keep_alive(state.config.performance.keep_alive);

    let service = service_fn(move |req| http::handle_request(req, Arc::clone(&state), peer_addr));
    let conn = builder.serve_connection(TokioIo::new(stream), service);

    match tokio::time::timeout(limit, conn).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => logger::log_warning(&format!(
            "Connection from {peer_addr} timed out after {} seconds",
            limit.as_secs()
        )),
    }
}
