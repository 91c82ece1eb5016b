//! Request ID middleware for request correlation
//!
//! Attaches a UUID to each incoming request, available to handlers via Axum
//! extensions and echoed in the `x-request-id` response header. A valid UUID
//! supplied by the client in the same header is kept.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Request ID header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID wrapper type for Axum extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate a new random request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Take the client's ID from the headers if it is a valid UUID, otherwise generate one
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Self)
            .unwrap_or_default()
    }

    /// Get the UUID value
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Middleware that attaches a request ID to each request
///
/// The request ID is:
/// 1. Taken from a valid client-supplied `x-request-id`, or generated as a UUID v4
/// 2. Attached to the request via extensions (accessible in handlers)
/// 3. Added to the response headers for client correlation
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        "Incoming request"
    );

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uuid_is_honored() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(RequestId::from_headers(&headers).as_uuid(), id);
    }

    #[test]
    fn test_invalid_client_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let id = RequestId::from_headers(&headers);
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_missing_header_generates_v4() {
        let id = RequestId::from_headers(&HeaderMap::new());
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }
}
