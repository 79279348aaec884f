//! Portal Core - Shared types library.
//!
//! This crate provides the types used by the Portal front end:
//! - `web` - Server-rendered front end and backend proxy
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. The backend API owns persistence; these types mirror its JSON
//! shapes so the front end can hold a typed, cached copy.
//!
//! # Modules
//!
//! - [`types`] - Record IDs, emails, users, documents, analytics, pagination,
//!   locales and themes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
