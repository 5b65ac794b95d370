//! Infrastructure configuration modules.

pub mod gateway;
pub mod logging;
pub mod quotes;
pub mod refresh;
pub mod settings;

pub(crate) use crate::application::pipeline::{seconds, slot_count};
