//! HTTP protocol layer module
//!
//! Request entry point and response builders. The router decides which
//! requests reach the dispatcher; everything here speaks hyper types.

pub mod response;
pub mod router;

// Re-export commonly used items
pub use response::{
    build_404_response, build_413_response, build_health_response, build_json_response,
};
pub use router::handle_request;
