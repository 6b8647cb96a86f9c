//! # Error Types
//!
//! Errors raised while constructing or parsing the shared value types.

use thiserror::Error;

/// Errors from coin, decimal and address handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Denomination does not match `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
    #[error("Invalid denomination: {0:?}")]
    InvalidDenom(String),

    /// The same denomination appears twice in a coin set.
    #[error("Duplicate denomination: {0}")]
    DuplicateDenom(String),

    /// Arithmetic left the representable range.
    #[error("Amount overflow while adding {denom}")]
    Overflow { denom: String },

    /// Decimal string could not be parsed.
    #[error("Invalid decimal {input:?}: {reason}")]
    InvalidDecimal { input: String, reason: &'static str },

    /// Address string lacks the expected human-readable prefix.
    #[error("Address {address:?} does not start with prefix {expected:?}")]
    WrongAddressPrefix { address: String, expected: String },

    /// Address body is not valid hex of the right length.
    #[error("Malformed address {0:?}")]
    MalformedAddress(String),
}
