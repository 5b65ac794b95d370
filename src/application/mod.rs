//! Application services (use cases).
//!
//! These services orchestrate domain logic and drive the outbound ports:
//! the refresh pipeline, the gateway-backed quote fetcher, the shared
//! throttle, and the default builder and scorer collaborators.

pub mod builder;
pub mod pipeline;
pub mod quote;
pub mod scoring;
pub mod throttle;

pub use builder::EntryProposalBuilder;
pub use pipeline::{RefreshDefaults, RefreshParams, RefreshPipeline};
pub use quote::{QuoteFetcher, QuoteSettings};
pub use scoring::CriteriaScorer;
pub use throttle::{RefreshThrottle, ThrottlePermit, ThrottleSettings};
