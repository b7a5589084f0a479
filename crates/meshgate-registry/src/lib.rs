//! NGSI-LD context broker client and token management
//!
//! Production backend for the [`EntityRegistry`] capability, plus the
//! Keycloak client-credentials token manager used when the broker sits
//! behind the continuum's identity provider.
//!
//! [`EntityRegistry`]: meshgate_overlay::registry::EntityRegistry

pub mod client;
pub mod token;

pub use client::ContextBrokerClient;
pub use token::{TokenConfig, TokenManager};
