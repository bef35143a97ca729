//! Request identification and accounting.

use std::time::Instant;

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::observability::metrics;

/// Header carrying the request ID, set when absent and echoed back.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID of a request, or `-` when none was assigned.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Label used for the `path` metric dimension.
///
/// API paths are kept; everything else is collapsed to bound cardinality.
pub fn path_label(path: &str) -> &str {
    if path.starts_with("/api/") {
        path
    } else {
        "static"
    }
}

/// Middleware recording request count and latency.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = path_label(request.uri().path()).to_string();

    let response = next.run(request).await;

    metrics::record_request(&method, &path, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "-");

        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn test_path_label() {
        assert_eq!(path_label("/api/mint"), "/api/mint");
        assert_eq!(path_label("/"), "static");
        assert_eq!(path_label("/assets/app.js"), "static");
    }
}
