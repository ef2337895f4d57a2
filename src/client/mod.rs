//! Client side of the users resource.
//!
//! [`UsersApi`] is the request/response boundary to the service, with an
//! HTTP and an in-process implementation. [`UsersCache`] keeps a locally
//! materialized view of one users query on top of it.

mod api;
mod cache;
mod http;
mod listeners;

pub use api::*;
pub use cache::*;
pub use http::*;
pub use listeners::Subscription;
