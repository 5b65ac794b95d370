//! Outbound ports (driven side): interfaces implemented by outbound adapters
//! or injected by callers.

pub mod builder;
pub mod fetcher;
pub mod gateway;
pub mod scorer;
