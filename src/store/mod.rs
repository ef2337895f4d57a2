//! In-memory user store backing the mock service.
//!
//! The store is the single source of truth for the user set. It is
//! constructed explicitly and shared through `AppState`.

mod repository;

pub use repository::*;
