//! Outbound adapters (driven side).

pub mod replay;
