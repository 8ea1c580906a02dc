//! Request correlation IDs.
//!
//! A caller-supplied `x-request-id` is kept when it is non-empty printable
//! ASCII; otherwise a UUID v4 is minted. The ID is echoed on the response
//! and exposed to inner layers and handlers as a [`RequestId`] extension.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation ID of the request being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Reads a usable ID from incoming headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(&REQUEST_ID_HEADER)?.to_str().ok()?;
        (!raw.is_empty()).then(|| Self(raw.to_string()))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = RequestId::from_headers(request.headers()).unwrap_or_else(RequestId::generate);
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
