//! Request correlation ids.
//!
//! A caller may send its own `x-request-id`; anything blank, longer than
//! [`MAX_REQUEST_ID_LEN`] or outside visible ASCII is replaced by a fresh
//! uuid. The chosen id is stored as a request extension, scoped into the
//! task-local read by error responses, and echoed on the response.

use crate::tracing::{scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Caller-supplied id, if it is usable as-is.
fn incoming_request_id(headers: &HeaderMap) -> Option<RequestId> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let usable = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw.bytes().all(|b| b.is_ascii_graphic());
    usable.then(|| RequestId::new(raw))
}

fn stamp(headers: &mut HeaderMap, request_id: &RequestId) {
    // Ids are either validated visible ASCII or uuids.
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = incoming_request_id(request.headers()).unwrap_or_else(|| {
        let generated = RequestId::default();
        debug!(request_id = %generated, "assigned request id");
        generated
    });

    stamp(request.headers_mut(), &request_id);
    request.extensions_mut().insert(request_id.clone());

    let mut response = scope_request_id(request_id.clone(), next.run(request)).await;
    stamp(response.headers_mut(), &request_id);
    response
}
