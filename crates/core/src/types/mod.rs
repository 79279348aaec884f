//! Core types for Portal.
//!
//! This module provides type-safe wrappers for the backend's domain concepts.

pub mod analytics;
pub mod document;
pub mod email;
pub mod id;
pub mod locale;
pub mod pagination;
pub mod theme;
pub mod user;

pub use analytics::{Activity, DashboardData};
pub use document::{Document, DocumentInput};
pub use email::{Email, EmailError};
pub use id::RecordId;
pub use locale::Locale;
pub use pagination::{PageError, PageRequest, Paginated};
pub use theme::{ColorScheme, Theme};
pub use user::{SessionUser, UserInput, UserRecord};
