//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`gateway`] - `ScriptedGateway`, a [`MarketDataGateway`](crate::port::MarketDataGateway)
//!   with per-contract tick scripts and call counters.
//! - [`fetcher`] - Stub [`SnapshotFetcher`](crate::port::SnapshotFetcher)s:
//!   accepting, flaky, timing out, instrumented.
//! - [`entry`] - Builders for rejection entries and legs.

pub mod entry;
pub mod fetcher;
pub mod gateway;
