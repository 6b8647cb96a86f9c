//! # Shared Types Crate
//!
//! Value types shared by the genesis builder and the node runtime.
//!
//! ## Design Principles
//!
//! - **Canonical by construction**: coin sets are sorted and de-duplicated,
//!   decimals always print 18 fractional digits, so equal values serialize to
//!   equal bytes.
//! - **No hidden configuration**: address prefixes travel in an explicit
//!   [`AddressCodec`] value.

pub mod address;
pub mod coins;
pub mod decimal;
pub mod errors;

pub use address::{Address, AddressCodec, ADDRESS_LEN};
pub use coins::{validate_denom, Amount, Coin, Coins};
pub use decimal::{Dec, DECIMAL_PRECISION};
pub use errors::*;
