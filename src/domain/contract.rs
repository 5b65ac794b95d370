//! Venue instrument descriptors for option legs.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::leg::{OptionLeg, Right};

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_MULTIPLIER: &str = "100";

/// Option contract as the gateway expects it.
///
/// `exchange`, `trading_class` and `con_id` are optional; when any of them
/// is missing the quote fetcher asks the gateway to qualify the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: String,
    /// Expiry as `YYYYMMDD`.
    pub last_trade_date: String,
    pub strike: f64,
    pub right: Right,
    pub exchange: Option<String>,
    pub trading_class: Option<String>,
    pub con_id: Option<i64>,
    pub currency: String,
    pub multiplier: String,
}

impl OptionContract {
    /// Build a descriptor from a leg, normalizing expiry and right.
    pub fn from_leg(leg: &OptionLeg) -> Result<Self, DomainError> {
        let symbol = leg.symbol.trim();
        if symbol.is_empty() {
            return Err(DomainError::EmptySymbol);
        }
        if !(leg.strike.is_finite() && leg.strike > 0.0) {
            return Err(DomainError::NonPositiveStrike { strike: leg.strike });
        }

        Ok(Self {
            symbol: symbol.to_ascii_uppercase(),
            last_trade_date: normalize_expiry(&leg.expiry)?,
            strike: leg.strike,
            right: leg.right,
            exchange: None,
            trading_class: None,
            con_id: None,
            currency: DEFAULT_CURRENCY.to_string(),
            multiplier: DEFAULT_MULTIPLIER.to_string(),
        })
    }

    /// True when the venue routing metadata is fully known.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.exchange.as_deref().is_some_and(|e| !e.is_empty())
            && self.trading_class.as_deref().is_some_and(|t| !t.is_empty())
            && self.con_id.is_some()
    }

    /// Stable lookup key: `SYMBOL|YYYYMMDD|STRIKE|R`.
    #[must_use]
    pub fn key(&self) -> String {
        contract_key(&self.symbol, &self.last_trade_date, self.strike, self.right)
    }
}

impl fmt::Display for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{}",
            self.symbol,
            self.last_trade_date,
            self.strike,
            self.right.token()
        )
    }
}

/// Lookup key shared by contracts and recorded quotes.
#[must_use]
pub fn contract_key(symbol: &str, expiry: &str, strike: f64, right: Right) -> String {
    format!(
        "{}|{}|{}|{}",
        symbol.trim().to_ascii_uppercase(),
        expiry,
        strike,
        right.token()
    )
}

/// Normalize an expiry to 8 digits (`YYYYMMDD`).
///
/// Accepts `2025-12-19`, `2025/12/19`, `20251219` and ISO timestamps whose
/// date part has one of those shapes.
pub fn normalize_expiry(raw: &str) -> Result<String, DomainError> {
    let invalid = || DomainError::InvalidExpiry {
        value: raw.to_string(),
    };

    let date_part = raw.trim().split(['T', ' ']).next().unwrap_or_default();
    let digits: String = date_part.chars().filter(|c| !matches!(c, '-' | '/')).collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(&digits, "%Y%m%d").map_err(|_| invalid())?;
    Ok(digits)
}

/// Parse an expiry into a calendar date.
pub fn expiry_date(raw: &str) -> Result<NaiveDate, DomainError> {
    let digits = normalize_expiry(raw)?;
    NaiveDate::parse_from_str(&digits, "%Y%m%d").map_err(|_| DomainError::InvalidExpiry {
        value: raw.to_string(),
    })
}
