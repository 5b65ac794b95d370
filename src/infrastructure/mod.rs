//! Infrastructure layer.
//!
//! Turns a TOML document and environment keys into a wired refresh
//! pipeline, and serves the inbound operator port over the replay gateway.
//!
//! - [`config`] - `[logging]`, `[refresh]`, `[gateway]`, `[quotes]` and
//!   `[criteria]` sections with runtime overrides
//! - [`bootstrap`] - Builds the quote fetcher and pipeline from a [`config::settings::Config`]
//! - [`operator`] - [`OperatorPort`](crate::port::OperatorPort) implementation

pub mod bootstrap;
pub mod config;
pub mod operator;
