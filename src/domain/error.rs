//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated,
//! typically while turning a loosely-typed rejection entry or option leg into
//! a venue-ready contract description.
//!
//! # Examples
//!
//! ```
//! use quote_refresh::domain::contract::normalize_expiry;
//! use quote_refresh::domain::error::DomainError;
//!
//! let result = normalize_expiry("next friday");
//! assert!(matches!(result, Err(DomainError::InvalidExpiry { .. })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Expiry could not be normalized to an 8-digit `YYYYMMDD` date.
    #[error("invalid expiry '{value}'")]
    InvalidExpiry {
        /// The raw expiry that was provided.
        value: String,
    },

    /// Option right is neither a call nor a put.
    #[error("invalid option right '{value}'")]
    InvalidRight {
        /// The raw right that was provided.
        value: String,
    },

    /// Strike must be a positive finite number.
    #[error("strike must be positive, got {strike}")]
    NonPositiveStrike {
        /// The invalid strike.
        strike: f64,
    },

    /// Leg symbol is empty.
    #[error("leg symbol cannot be empty")]
    EmptySymbol,

    /// Proposals must have at least one leg.
    #[error("legs cannot be empty")]
    EmptyLegs,

    /// A required field is missing from an input entry.
    #[error("missing field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// An input entry does not have the expected shape.
    #[error("malformed entry: {reason}")]
    MalformedEntry {
        /// What the parser tripped over.
        reason: String,
    },
}
