//! Services over the backend API.
//!
//! - `auth` - Login, registration, token checks and password reset
pub mod auth;
