//! Test harness for the portal front end.
//!
//! [`TestPortal::start`] serves [`portal_web::app`] on `127.0.0.1:0` with a
//! [`MockServer`] as its backend. The client keeps cookies and does not
//! follow redirects, so tests can assert on `Location` and `Set-Cookie`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p portal-integration-tests
//! ```

use std::path::PathBuf;

use portal_web::config::PortalConfig;
use portal_web::state::AppState;
use reqwest::{Client, redirect};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token the fake backend hands out on login.
pub const TOKEN: &str = "test-token-1";

/// A running portal plus its fake backend.
pub struct TestPortal {
    pub backend: MockServer,
    pub client: Client,
    base_url: String,
}

impl TestPortal {
    /// Start a portal in front of a fresh mock backend.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or the state cannot be built.
    pub async fn start() -> Self {
        let backend = MockServer::start().await;
        let api_url = Url::parse(&format!("{}/api/", backend.uri())).expect("mock backend URL");
        let mut config = PortalConfig::for_backend(api_url);
        config.static_dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../web/static"));
        let state = AppState::new(config).expect("app state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, portal_web::app(state))
                .await
                .expect("test server");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("test client");

        Self {
            backend,
            client,
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL of a portal path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Answer `POST /auth/login` with [`TOKEN`] and [`user_json`].
    pub async fn mock_login_success(&self) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "token": TOKEN, "user": user_json() })),
            )
            .mount(&self.backend)
            .await;
    }

    /// Accept [`TOKEN`] on `GET /auth/verify`.
    pub async fn mock_verify(&self) {
        Mock::given(method("GET"))
            .and(path("/api/auth/verify"))
            .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "valid": true, "user": user_json() })),
            )
            .mount(&self.backend)
            .await;
    }

    /// Log in through the form, leaving the auth cookie in the client.
    ///
    /// # Panics
    ///
    /// Panics if the login does not redirect.
    pub async fn sign_in(&self) {
        self.mock_login_success().await;
        self.mock_verify().await;

        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("email", "ada@example.com"), ("password", "correct-horse")])
            .send()
            .await
            .expect("login request");
        assert!(
            response.status().is_redirection(),
            "login answered {}",
            response.status()
        );
    }
}

/// The signed-in user as the backend describes it.
#[must_use]
pub fn user_json() -> Value {
    json!({ "id": 42, "name": "Ada Lovelace", "email": "ada@example.com", "role": "admin" })
}

/// A `Set-Cookie` header of `response` starting with `name=`.
#[must_use]
pub fn set_cookie(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
