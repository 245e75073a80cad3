//! Storage traits for auth-related data.
//!
//! The core holds no mutable process-wide state; all mutation goes through
//! these traits. Implementations must be safe for concurrent access.

mod client;
mod jti;

pub use client::ClientStorage;
pub use jti::{InMemoryJtiStore, JtiStorage};
