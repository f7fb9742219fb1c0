//! Async client for the `/api/v1/*` management API of Technicolor/Sercomm
//! cable gateways.
//!
//! The gateway speaks form-encoded HTTP with JSON responses carrying a
//! top-level `error` field (`"ok"` on success). Authentication is a two-step
//! salted challenge ([`auth`]), sessions live in a cookie jar with a CSRF
//! token mirrored into request headers, and the MAC/site filter tables accept
//! two write encodings ([`filter::TableWrite`]).
//!
//! This crate stays at the wire level: typed request/response structs with
//! defensive defaults, no domain logic. `netwarden-core` builds the presence
//! and lockdown machinery on top.

pub mod auth;
pub mod client;
pub mod error;
pub mod filter;
pub mod host;
pub mod transport;

pub use auth::derive_credential;
pub use client::{GatewayClient, GatewayConfig};
pub use error::Error;
pub use filter::{
    FilterAction, MacFilterEntry, SiteFilterEntry, SiteFilterTables, TableWrite, next_free_index,
};
pub use host::HostEntry;
pub use transport::TransportConfig;
