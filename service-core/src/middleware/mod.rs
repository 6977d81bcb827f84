pub mod metrics;
pub mod security_headers;
pub mod tracing;

pub use metrics::metrics_middleware;
pub use security_headers::security_headers_middleware;
pub use tracing::{REQUEST_ID_HEADER, request_id_middleware};

use axum::http::{Method, header};
use tower_http::cors::{Any, CorsLayer};

/// CORS for a browser SPA served from any origin.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
