//! Generic forwarder: `ANY /api/proxy/{*path}`.
//!
//! The request goes to `{backend}/{path}` with its method, query string,
//! body and headers. The backend status is answered with its JSON body.
//! Callers without an `Authorization` header get the auth cookie's token
//! as a bearer.

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, error, instrument};
use url::form_urlencoded;

use super::{ProxyError, relay};
use crate::session::cookie::{AUTH_COOKIE_NAME, read_cookie};
use crate::state::AppState;

/// Largest request body forwarded.
pub const MAX_PROXY_BODY: usize = 2 * 1024 * 1024;

const PROXY_FAILED: &str = "Failed to proxy request to backend service";

/// Request headers never forwarded: the target host, framing, and
/// connection-level headers.
const DROPPED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "proxy-authorization",
    "proxy-authenticate",
    "accept-encoding",
];

/// The backend path of a proxied request: everything after `/proxy/`,
/// still percent-encoded.
#[must_use]
pub fn backend_path(uri: &Uri) -> &str {
    uri.path()
        .split_once("/proxy/")
        .map_or("", |(_, rest)| rest)
}

/// Headers to send on: the caller's, minus [`DROPPED_HEADERS`].
#[must_use]
pub fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in DROPPED_HEADERS {
        forwarded.remove(*name);
    }
    forwarded
}

/// Forward any request under `/api/proxy/` to the backend.
#[instrument(skip_all, fields(method = %request.method(), path = backend_path(request.uri())))]
pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, MAX_PROXY_BODY).await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "Unreadable proxy request body");
            return ProxyError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                .into_response();
        }
    };

    let client = if parts.headers.contains_key(header::AUTHORIZATION) {
        state.api().anonymous()
    } else {
        match read_cookie(&parts.headers, AUTH_COOKIE_NAME) {
            Some(token) => state.api().with_token(&SecretString::from(token)),
            None => state.api().anonymous(),
        }
    };

    let path = backend_path(&parts.uri);
    let mut builder = match client.request(parts.method.clone(), path) {
        Ok(builder) => builder,
        Err(e) => {
            debug!(error = %e, "Rejected proxy path");
            return ProxyError::new(StatusCode::BAD_REQUEST, "Invalid proxy path").into_response();
        }
    };

    if let Some(query) = parts.uri.query() {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        builder = builder.query(&pairs);
    }

    builder = builder.headers(forwarded_headers(&parts.headers));
    if has_body(&parts.method, &body) {
        builder = builder.body(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, path, "Proxy request failed");
            return ProxyError::internal(PROXY_FAILED).into_response();
        }
    };

    let status = response.status();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, path, "Proxy response unreadable");
            return ProxyError::internal(PROXY_FAILED).into_response();
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return relay(status, None);
    }
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(json) => relay(status, Some(json)),
        Err(e) => {
            error!(error = %e, path, %status, "Backend answered with non-JSON body");
            ProxyError::internal(PROXY_FAILED).into_response()
        }
    }
}

fn has_body(method: &Method, body: &Bytes) -> bool {
    !body.is_empty() && method != Method::GET && method != Method::HEAD
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::http::HeaderValue;

    #[test]
    fn test_backend_path() {
        let uri: Uri = "/api/proxy/users/42/documents?page=2".parse().unwrap();
        assert_eq!(backend_path(&uri), "users/42/documents");

        let nested: Uri = "/proxy/reports%2F2024".parse().unwrap();
        assert_eq!(backend_path(&nested), "reports%2F2024");
    }

    #[test]
    fn test_forwarded_headers_drop_host_and_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("portal.example"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert("x-trace", HeaderValue::from_static("1"));

        let forwarded = forwarded_headers(&headers);
        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::CONNECTION).is_none());
        assert!(forwarded.get("keep-alive").is_none());
        assert_eq!(forwarded.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(forwarded.get("x-trace").unwrap(), "1");
    }

    #[test]
    fn test_get_never_sends_body() {
        assert!(!has_body(&Method::GET, &Bytes::from_static(b"{}")));
        assert!(has_body(&Method::PATCH, &Bytes::from_static(b"{}")));
        assert!(!has_body(&Method::POST, &Bytes::new()));
    }
}
