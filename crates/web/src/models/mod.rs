//! Types kept in the per-browser session.

pub mod session;

pub use session::keys as session_keys;
