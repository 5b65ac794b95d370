//! Inbound ports (driving side): capability surfaces consumed by inbound
//! adapters.

pub mod operator;
