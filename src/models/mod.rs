//! Data models for the users resource.
//!
//! Field names and casing match the JSON consumed by the demo front-end.

mod page;
mod preferences;
mod user;

pub use page::*;
pub use preferences::*;
pub use user::*;
