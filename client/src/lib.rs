//! HTTP transport for the Binder sync protocol.
//!
//! Implements the engine's [`binder_engine::SyncApi`] over `reqwest` with
//! a bounded request timeout. The bearer credential comes from a
//! [`TokenProvider`]; when it yields no credential, calls fail fast with
//! an auth error before anything goes on the wire.

pub mod api;
pub mod auth;

pub use api::{ClientConfig, HttpSyncApi};
pub use auth::{NoToken, StaticToken, TokenProvider};
