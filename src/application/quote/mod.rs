//! Gateway-backed quote refresh for strategy proposals.
//!
//! [`QuoteFetcher`] is the default [`SnapshotFetcher`](crate::port::SnapshotFetcher):
//! it opens one gateway session per call, walks the proposal's legs in order,
//! requests a quote per leg with bounded retries, reprices the leg and finally
//! rescores the proposal.

mod fetcher;
mod request;
mod session;
mod settings;

pub use fetcher::QuoteFetcher;
pub use request::{RequestGuard, RequestRegistry};
pub use session::SessionGuard;
pub use settings::{QuoteSettings, DEFAULT_GENERIC_TICKS};
