//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /about                  - About page
//! GET  /blog                   - Blog page
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//!
//! # Dashboard (requires auth)
//! GET  /dashboard              - Analytics overview
//! GET  /dashboard/users        - Paginated user list
//! POST /dashboard/users/{id}/status - Enable or disable a user
//! GET  /dashboard/documents    - Paginated document list
//!
//! # Settings
//! GET  /settings               - Language and theme
//! POST /settings/theme         - Store theme cookie
//! POST /settings/locale        - Store locale cookie
//!
//! # Backend proxy (JSON)
//! POST /api/auth/login         - Login, sets auth cookie
//! POST /api/auth/register      - Register, sets auth cookie
//! POST /api/auth/logout        - Logout, clears auth cookie
//! POST /api/auth/refresh       - Refresh token, resets auth cookie
//! GET  /api/auth/me            - Current user
//! POST /api/auth/password-reset          - Request reset mail
//! POST /api/auth/password-reset/confirm  - Set new password
//! GET|POST /api/users          - List / create users
//! GET|PUT|DELETE /api/users/{id}
//! GET|POST /api/documents      - List / create documents
//! GET|PUT|DELETE /api/documents/{id}
//! GET  /api/analytics/dashboard
//! GET  /api/analytics/user-activity
//! ANY  /api/proxy/{*path}      - Generic forwarder
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod pages;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the login, registration and logout routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/users", get(dashboard::users))
        .route("/users/{id}/status", post(dashboard::toggle_status))
        .route("/documents", get(dashboard::documents))
}

/// Create the settings routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::show))
        .route("/theme", post(settings::set_theme))
        .route("/locale", post(settings::set_locale))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Static pages
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/blog", get(pages::blog))
        // Auth pages
        .merge(auth_routes())
        // Dashboard pages
        .nest("/dashboard", dashboard_routes())
        // Settings
        .nest("/settings", settings_routes())
        // Backend proxy
        .nest("/api", api::api_routes())
}
