//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!   entries ────▶ │  Refresh pipeline        │ ────▶ RefreshResult
//!                 │  (application)           │
//!                 └──────────────────────────┘
//!                   │          │          │
//!                   ▼          ▼          ▼
//!             ProposalBuilder  │   ProposalScorer
//!                      SnapshotFetcher
//!                              │
//!                              ▼
//!                     MarketDataGateway
//! ```
//!
//! # Available Ports
//!
//! - [`MarketDataGateway`], [`GatewaySession`] - Venue market data
//! - [`SnapshotFetcher`] - Refresh one proposal's quotes
//! - [`ProposalBuilder`] - Entry validation boundary
//! - [`ProposalScorer`] - Acceptance scoring collaborator
//! - [`OperatorPort`] - Use-cases driven by inbound adapters

pub mod inbound;
pub mod outbound;

pub use inbound::operator::{ConfigView, OperatorPort, RefreshRequest};

pub use outbound::builder::ProposalBuilder;
pub use outbound::fetcher::{FetchError, SnapshotFetcher, SnapshotRequest};
pub use outbound::gateway::{
    GatewaySession, MarketDataGateway, MarketDataRequest, OptionGreeks, PriceField, RequestId,
    TickUpdate,
};
pub use outbound::scorer::{ProposalScorer, Scoring, ScoringContext};
