//! Backend API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth; nothing is synced or cached here
//! - Every call is JSON in, JSON out, against the configured base URL
//! - Non-2xx responses become [`ApiError::Status`] carrying the parsed error
//!   body when there is one
//! - `204 No Content` (and any empty 2xx body) yields `None` instead of a
//!   parse error
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_web::api::ApiClient;
//!
//! let client = ApiClient::new(&config)?.with_token(&token);
//!
//! let page = client.users().list(PageRequest::default(), &Filters::new()).await?;
//! let dashboard = client.analytics().dashboard().await?;
//! ```

pub mod analytics;
pub mod documents;
pub mod users;

pub use analytics::AnalyticsApi;
pub use documents::DocumentsApi;
pub use users::UsersApi;

use std::sync::Arc;

use portal_core::{PageError, PageRequest, RecordId};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::PortalConfig;

/// Extra query parameters passed alongside `page`/`limit` on list calls.
pub type Filters = Vec<(String, String)>;

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error: {status}")]
    Status {
        status: StatusCode,
        /// Parsed JSON error body, if the backend sent one.
        info: Option<serde_json::Value>,
    },

    /// A 2xx body could not be decoded into the expected type.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A 2xx response had no body where one was required.
    #[error("empty response from {0}")]
    EmptyBody(String),

    /// The endpoint would resolve outside the backend base URL, or a record
    /// id would change which endpoint is addressed.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A page request or page response broke the pagination invariants.
    #[error("pagination error: {0}")]
    Page(#[from] PageError),
}

impl ApiError {
    /// The HTTP status, for errors that came with one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The parsed error body, if any.
    #[must_use]
    pub const fn info(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Status { info, .. } => info.as_ref(),
            _ => None,
        }
    }

    /// A backend-supplied message (`message` or `error` field of the body).
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        let info = self.info()?;
        info.get("message")
            .or_else(|| info.get("error"))
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
    }

    /// Whether the backend reported 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Whether the backend rejected the credentials or token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ApiClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the backend JSON API.
///
/// Cheap to clone; clones share one connection pool. A client scoped to a
/// session (see [`ApiClient::with_token`]) sends `Authorization: Bearer` on
/// every request.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    token: Option<SecretString>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiClient {
    /// Create a new backend API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PortalConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
            token: None,
        })
    }

    /// A copy of this client that authenticates as the given session token.
    #[must_use]
    pub fn with_token(&self, token: &SecretString) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token: Some(token.clone()),
        }
    }

    /// A copy of this client without a session token.
    #[must_use]
    pub fn anonymous(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token: None,
        }
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether requests from this client carry a session token.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// The underlying HTTP client, for the raw proxy.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Users endpoints.
    #[must_use]
    pub const fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    /// Documents endpoints.
    #[must_use]
    pub const fn documents(&self) -> DocumentsApi<'_> {
        DocumentsApi::new(self)
    }

    /// Analytics endpoints.
    #[must_use]
    pub const fn analytics(&self) -> AnalyticsApi<'_> {
        AnalyticsApi::new(self)
    }

    /// Resolve an endpoint such as `/auth/login` against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidEndpoint` if the result would leave the base
    /// URL (absolute URLs, `..` segments climbing above it).
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        let base = &self.inner.base_url;
        let relative = endpoint.trim_start_matches('/');
        let url = base
            .join(relative)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        if url.origin() != base.origin() || !url.path().starts_with(base.path()) {
            return Err(ApiError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(url)
    }

    /// Start a request to `endpoint`, with the session token attached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidEndpoint` if the endpoint does not resolve
    /// under the base URL.
    pub fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint_url(endpoint)?;
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }
        Ok(builder)
    }

    /// Send a prepared request and decode the JSON response.
    ///
    /// Returns `Ok(None)` for `204 No Content` or an empty 2xx body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if no response arrives,
    /// `ApiError::Status` for non-2xx responses and `ApiError::Decode` if a
    /// 2xx body is not the expected JSON.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let info = serde_json::from_slice::<serde_json::Value>(&body).ok();
            debug!(status = %status, has_info = info.is_some(), "Backend returned error status");
            return Err(ApiError::Status { status, info });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// `GET endpoint`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    #[instrument(skip(self), fields(authenticated = self.has_token()))]
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>, ApiError> {
        self.execute(self.request(Method::GET, endpoint)?).await
    }

    /// `GET endpoint?query`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    #[instrument(skip(self, query), fields(authenticated = self.has_token()))]
    pub async fn get_with_query<T, Q>(&self, endpoint: &str, query: &Q) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute(self.request(Method::GET, endpoint)?.query(query))
            .await
    }

    /// `POST endpoint` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    #[instrument(skip(self, body), fields(authenticated = self.has_token()))]
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::POST, endpoint)?.json(body))
            .await
    }

    /// `POST endpoint` without a body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    #[instrument(skip(self), fields(authenticated = self.has_token()))]
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Option<T>, ApiError> {
        self.execute(self.request(Method::POST, endpoint)?).await
    }

    /// `PUT endpoint` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    #[instrument(skip(self, body), fields(authenticated = self.has_token()))]
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.request(Method::PUT, endpoint)?.json(body))
            .await
    }

    /// `DELETE endpoint`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`].
    #[instrument(skip(self), fields(authenticated = self.has_token()))]
    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Option<T>, ApiError> {
        self.execute(self.request(Method::DELETE, endpoint)?).await
    }
}

/// Turn an optional body into a required one.
///
/// # Errors
///
/// Returns `ApiError::EmptyBody` naming the endpoint when `value` is `None`.
pub fn required<T>(value: Option<T>, endpoint: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::EmptyBody(endpoint.to_string()))
}

/// Endpoint of one record in `collection`, such as `/users/42`.
///
/// # Errors
///
/// Returns `ApiError::InvalidEndpoint` for ids that are empty, `.` or `..`,
/// or contain `/`, `\`, `?`, `#` or `%`. Any of those could address another
/// record or another collection once joined onto the base URL.
pub fn item_endpoint(collection: &str, id: &RecordId) -> Result<String, ApiError> {
    let id = id.to_string();
    let id = id.trim();
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '?', '#', '%']) {
        return Err(ApiError::InvalidEndpoint(format!("{collection}/{id}")));
    }
    Ok(format!("{collection}/{id}"))
}

/// Query pairs for a list call: `page`, `limit`, then the filters.
#[must_use]
pub fn list_query(request: PageRequest, filters: &[(String, String)]) -> Filters {
    let mut query = Vec::with_capacity(filters.len() + 2);
    query.push(("page".to_string(), request.page().to_string()));
    query.push(("limit".to_string(), request.limit().to_string()));
    query.extend(
        filters
            .iter()
            .filter(|(k, _)| k != "page" && k != "limit")
            .cloned(),
    );
    query
}

/// Split raw query pairs into a page request and the remaining filters.
///
/// Unparseable `page`/`limit` values fall back to the defaults.
#[must_use]
pub fn split_page_params(pairs: Vec<(String, String)>) -> (PageRequest, Filters) {
    let mut page = None;
    let mut limit = None;
    let mut filters = Vec::new();
    for (key, value) in pairs {
        match key.as_str() {
            "page" => page = value.trim().parse().ok(),
            "limit" => limit = value.trim().parse().ok(),
            _ => filters.push((key, value)),
        }
    }
    (PageRequest::from_query(page, limit), filters)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        ApiClient::new(&PortalConfig::for_backend(url)).unwrap()
    }

    #[test]
    fn test_endpoint_url_joins_under_base() {
        let config = PortalConfig::for_backend(Url::parse("http://backend.test/api/").unwrap());
        let client = ApiClient::new(&config).unwrap();

        let url = client.endpoint_url("/auth/login").unwrap();
        assert_eq!(url.as_str(), "http://backend.test/api/auth/login");

        let url = client.endpoint_url("users/5").unwrap();
        assert_eq!(url.as_str(), "http://backend.test/api/users/5");
    }

    #[test]
    fn test_endpoint_url_rejects_escapes() {
        let config = PortalConfig::for_backend(Url::parse("http://backend.test/api/").unwrap());
        let client = ApiClient::new(&config).unwrap();

        assert!(matches!(
            client.endpoint_url("../admin"),
            Err(ApiError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            client.endpoint_url("http://evil.test/api/x"),
            Err(ApiError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            client.endpoint_url("//evil.test/api/x"),
            Err(ApiError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_item_endpoint_keeps_ids_inside_their_collection() {
        assert_eq!(item_endpoint("/users", &RecordId::from(42)).unwrap(), "/users/42");
        assert_eq!(
            item_endpoint("/documents", &RecordId::from("doc-7")).unwrap(),
            "/documents/doc-7"
        );
        for id in ["", " ", ".", "..", "../documents/5", "a\\b", "5?force=1", "5#x", "..%2Fdocuments"] {
            assert!(
                matches!(
                    item_endpoint("/users", &RecordId::from(id)),
                    Err(ApiError::InvalidEndpoint(_))
                ),
                "{id:?} accepted"
            );
        }
    }

    #[test]
    fn test_list_query_puts_page_params_first() {
        let request = PageRequest::new(2, 20).unwrap();
        let filters = vec![
            ("role".to_string(), "admin".to_string()),
            ("page".to_string(), "9".to_string()),
        ];
        let query = list_query(request, &filters);
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "20".to_string()),
                ("role".to_string(), "admin".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_page_params() {
        let pairs = vec![
            ("page".to_string(), "3".to_string()),
            ("q".to_string(), "report".to_string()),
            ("limit".to_string(), "abc".to_string()),
        ];
        let (request, filters) = split_page_params(pairs);
        assert_eq!(request.page(), 3);
        assert_eq!(request.limit(), portal_core::types::pagination::DEFAULT_LIMIT);
        assert_eq!(filters, vec![("q".to_string(), "report".to_string())]);
    }

    #[test]
    fn test_api_error_message_prefers_message_field() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            info: Some(json!({ "message": "Email taken", "error": "conflict" })),
        };
        assert_eq!(err.message(), Some("Email taken"));

        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            info: Some(json!({ "error": "Bad input" })),
        };
        assert_eq!(err.message(), Some("Bad input"));

        let err = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            info: None,
        };
        assert_eq!(err.message(), None);
    }

    #[tokio::test]
    async fn test_no_content_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/users/7"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result: Option<serde_json::Value> =
            client_for(&server).delete("/users/7").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_error_status_carries_parsed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .post::<serde_json::Value, _>("/auth/login", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.message(), Some("Bad credentials"));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_error_status_without_json_body_keeps_status_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get::<serde_json::Value>("/users/1")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(err.info().is_none());
    }

    #[tokio::test]
    async fn test_sends_json_body_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/documents/3"))
            .and(header("authorization", "Bearer tok-123"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "title": "New" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_token(&SecretString::from("tok-123"));
        let result: Option<serde_json::Value> = client
            .put("/documents/3", &json!({ "title": "New" }))
            .await
            .unwrap();
        assert_eq!(result, Some(json!({ "ok": true })));
    }

    #[tokio::test]
    async fn test_query_parameters_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .and(query_param("page", "1"))
            .and(query_param("q", "a b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let query = vec![
            ("page".to_string(), "1".to_string()),
            ("q".to_string(), "a b".to_string()),
        ];
        let result: Option<Vec<serde_json::Value>> = client_for(&server)
            .get_with_query("/users", &query)
            .await
            .unwrap();
        assert_eq!(result, Some(vec![]));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get::<serde_json::Value>("/auth/me")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let config = PortalConfig::for_backend(Url::parse("http://127.0.0.1:9/api/").unwrap());
        let client = ApiClient::new(&config).unwrap();

        let err = client.get::<serde_json::Value>("/auth/verify").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
