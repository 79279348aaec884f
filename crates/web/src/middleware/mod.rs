//! HTTP middleware stack for the portal.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, client hints)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Route guard (auth cookie check, `x-user-id` from verification)
//!
//! Extractors for handlers live in `auth` (token and user) and
//! `preferences` (locale and theme).

pub mod auth;
pub mod guard;
pub mod preferences;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, AuthToken, CurrentUser, OptionalToken, OptionalUser, clear_current_user,
    set_current_user,
};
pub use guard::{USER_ID_HEADER, route_guard};
pub use preferences::Preferences;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
