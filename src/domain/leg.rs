//! Option legs and mid-price provenance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Right {
    Call,
    Put,
}

impl Right {
    /// Parse a loosely formatted right (`call`, `C`, ` Put `, ...).
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "c" | "call" | "calls" => Ok(Self::Call),
            "p" | "put" | "puts" => Ok(Self::Put),
            _ => Err(DomainError::InvalidRight {
                value: raw.to_string(),
            }),
        }
    }

    /// Single-letter venue token.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }

    /// The opposite right, used to pair legs for put-call parity.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Call => Self::Put,
            Self::Put => Self::Call,
        }
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// Producer of a leg's mid price, declared in trust order.
///
/// `Ord` follows declaration order, so `MidSource::True` is the smallest
/// (most trusted) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidSource {
    /// Mean of a live, finite bid/ask pair.
    True,
    /// Put-call parity from the paired leg's true mid.
    ParityTrue,
    /// Put-call parity from the paired leg's last close.
    ParityClose,
    /// Vendor model price.
    Model,
    /// Last close.
    Close,
}

impl MidSource {
    /// All sources, most trusted first.
    pub const ALL: [Self; 5] = [
        Self::True,
        Self::ParityTrue,
        Self::ParityClose,
        Self::Model,
        Self::Close,
    ];

    /// Canonical tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::ParityTrue => "parity_true",
            Self::ParityClose => "parity_close",
            Self::Model => "model",
            Self::Close => "close",
        }
    }

    /// Parse a tag, ignoring case and surrounding whitespace.
    ///
    /// The legacy tag `parity` is accepted as `parity_true`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let tag = raw.trim().to_ascii_lowercase();
        if tag == "parity" {
            return Some(Self::ParityTrue);
        }
        Self::ALL.into_iter().find(|source| source.as_str() == tag)
    }

    /// Trusted sources price a leg well enough to skip a refresh.
    #[must_use]
    pub const fn is_trusted(self) -> bool {
        matches!(self, Self::True | Self::ParityTrue)
    }
}

impl fmt::Display for MidSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote and greek values delivered by one gateway snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    pub close: Option<f64>,
    pub model: Option<f64>,
    pub iv: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
}

impl QuoteSnapshot {
    /// True when both sides of the book are finite numbers.
    #[must_use]
    pub fn has_two_sided_quote(&self) -> bool {
        finite(self.bid).is_some() && finite(self.ask).is_some()
    }
}

/// One option contract within a multi-leg proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub symbol: String,
    /// Expiry as supplied by the caller; normalized when the contract is built.
    pub expiry: String,
    pub strike: f64,
    pub right: Right,
    /// Signed quantity: negative for short legs.
    pub position: i64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    pub close: Option<f64>,
    pub model: Option<f64>,
    pub iv: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
    pub mid: Option<f64>,
    pub mid_source: Option<MidSource>,
    /// Raw fallback chain hint, e.g. `"parity_close, model"`.
    pub mid_fallback: Option<String>,
    pub missing_edge: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl OptionLeg {
    /// Create an unquoted leg.
    pub fn new(
        symbol: impl Into<String>,
        expiry: impl Into<String>,
        strike: f64,
        right: Right,
        position: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            expiry: expiry.into(),
            strike,
            right,
            position,
            bid: None,
            ask: None,
            last: None,
            close: None,
            model: None,
            iv: None,
            delta: None,
            gamma: None,
            vega: None,
            theta: None,
            mid: None,
            mid_source: None,
            mid_fallback: None,
            missing_edge: false,
            refreshed_at: None,
        }
    }

    /// Short human label, e.g. `AAA 2025-12-19 420C x-1`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} {} {}{} x{}",
            self.symbol,
            self.expiry,
            self.strike,
            self.right.token(),
            self.position
        )
    }

    /// Absolute bid/ask spread when both sides are finite.
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        let bid = finite(self.bid)?;
        let ask = finite(self.ask)?;
        Some(ask - bid)
    }

    /// Spread as a percentage of the mid.
    #[must_use]
    pub fn spread_pct(&self) -> Option<f64> {
        let spread = self.spread()?;
        let mid = finite(self.mid).filter(|m| *m > 0.0)?;
        Some(spread / mid * 100.0)
    }

    /// Apply a live snapshot in place.
    ///
    /// Returns the signed change of the mid versus the prior value when both
    /// are known.
    pub fn apply_snapshot(&mut self, snapshot: &QuoteSnapshot, at: DateTime<Utc>) -> Option<f64> {
        let previous = self.mid;

        self.bid = snapshot.bid;
        self.ask = snapshot.ask;
        if snapshot.last.is_some() {
            self.last = snapshot.last;
        }
        if snapshot.close.is_some() {
            self.close = snapshot.close;
        }
        if snapshot.model.is_some() {
            self.model = snapshot.model;
        }
        if snapshot.iv.is_some() {
            self.iv = snapshot.iv;
        }
        if snapshot.delta.is_some() {
            self.delta = snapshot.delta;
        }
        if snapshot.gamma.is_some() {
            self.gamma = snapshot.gamma;
        }
        if snapshot.vega.is_some() {
            self.vega = snapshot.vega;
        }
        if snapshot.theta.is_some() {
            self.theta = snapshot.theta;
        }

        self.mid = super::mid::live_mid(self.bid, self.ask, self.last);
        self.mid_source = Some(MidSource::True);
        self.mid_fallback = None;
        self.missing_edge = false;
        self.refreshed_at = Some(at);

        match (previous, self.mid) {
            (Some(before), Some(after)) => Some(after - before),
            _ => None,
        }
    }

    /// Flag this leg as lacking a usable quote.
    pub fn mark_missing(&mut self) {
        self.missing_edge = true;
    }

    /// Per-metric presence flags for governance reporting.
    #[must_use]
    pub fn completeness(&self) -> LegCompleteness {
        LegCompleteness {
            leg: self.label(),
            bid: finite(self.bid).is_some(),
            ask: finite(self.ask).is_some(),
            mid: finite(self.mid).is_some(),
            iv: finite(self.iv).is_some(),
            delta: finite(self.delta).is_some(),
            gamma: finite(self.gamma).is_some(),
            vega: finite(self.vega).is_some(),
            theta: finite(self.theta).is_some(),
        }
    }
}

/// Which metrics a leg carries after a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegCompleteness {
    pub leg: String,
    pub bid: bool,
    pub ask: bool,
    pub mid: bool,
    pub iv: bool,
    pub delta: bool,
    pub gamma: bool,
    pub vega: bool,
    pub theta: bool,
}

impl LegCompleteness {
    /// True when every tracked metric is present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.bid && self.ask && self.mid && self.iv && self.delta && self.gamma && self.vega && self.theta
    }
}

/// Keep a value only when it is a finite number.
#[must_use]
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
