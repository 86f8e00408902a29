//! mini-forum/crates/mf-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the forum.

pub mod error;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod sanitize;
pub mod search;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
