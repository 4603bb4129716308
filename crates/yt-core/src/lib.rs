//! yatube/crates/yt-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Yatube.

pub mod error;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod services;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use pagination::{Page, Paginator};
pub use services::Yatube;
pub use traits::*;
