//! Domain types for client registrations.

mod client;

pub use client::{Client, ClientValidationError, OidcRegistration, TokenEndpointAuthMethod};
