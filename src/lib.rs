//! Quote refresh - re-price multi-leg option proposals and re-check them.
//!
//! A strategy screen rejects proposals whose quotes were stale or
//! incomplete. This crate takes those rejected entries, rebuilds each
//! proposal, fetches fresh per-leg quotes, resolves a mid price for every
//! leg (live, parity, model or close), rescores the proposal against
//! acceptance criteria and reports which ones qualify now.
//!
//! # Architecture
//!
//! - [`domain`] - Legs, proposals, mid-price resolution, spread policy,
//!   refresh outcomes. No I/O.
//! - [`port`] - Traits at the seams: market data gateway, snapshot fetcher,
//!   proposal builder, scorer, operator.
//! - [`application`] - Quote fetcher, refresh throttle, retrying refresh
//!   pipeline, entry builder, criteria scorer.
//! - [`adapter`] - CLI (inbound) and the replay gateway (outbound).
//! - [`infrastructure`] - Configuration, composition root, operator.
//! - [`error`] - Error types for the crate.
//!
//! # Features
//!
//! - `testkit` - Scripted gateway, stub fetchers and entry builders for
//!   integration tests.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use quote_refresh::adapter::outbound::replay::ReplayGateway;
//! use quote_refresh::application::pipeline::RefreshParams;
//! use quote_refresh::infrastructure::bootstrap;
//! use quote_refresh::infrastructure::config::settings::Config;
//!
//! # async fn run() -> quote_refresh::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let gateway = Arc::new(ReplayGateway::from_path("quotes.json")?);
//! let pipeline = bootstrap::build_pipeline(&config, gateway)?;
//! let entries = serde_json::from_str(&std::fs::read_to_string("rejections.json")?)?;
//! let result = pipeline.refresh(entries, RefreshParams::default()).await?;
//! println!("{} accepted", result.stats.accepted);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
