//! Session-stored display state.
//!
//! The session only caches what the layout needs between requests. The
//! backend token lives in its own cookie and is never written to the
//! session store.

/// Session keys.
pub mod keys {
    /// Key for the logged-in user shown in the navigation bar.
    pub const CURRENT_USER: &str = "current_user";
}
