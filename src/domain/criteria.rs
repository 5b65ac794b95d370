//! Acceptance criteria applied when a refreshed proposal is rescored.

use serde::{Deserialize, Serialize};

use super::spread::SpreadPolicy;

/// Thresholds a refreshed proposal must meet to be accepted.
///
/// Unset minimums are not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceCriteria {
    pub min_score: Option<f64>,
    pub min_pos: Option<f64>,
    pub min_rom: Option<f64>,
    pub min_edge: Option<f64>,
    pub min_credit: Option<f64>,
    /// Legs allowed to remain unquoted after a refresh.
    pub max_missing_legs: usize,
    /// Spread policy applied to every quoted leg.
    pub spread: SpreadPolicy,
}
