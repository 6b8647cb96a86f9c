//! # Coins
//!
//! Token amounts keyed by denomination. A [`Coins`] set is always sorted by
//! denomination, holds each denomination at most once and never stores a zero
//! amount, so two sets with the same content serialize identically.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::collections::BTreeMap;
use std::fmt;

use crate::TypeError;

/// Token amount. Amounts are unsigned, so negative balances cannot exist.
pub type Amount = u128;

/// A single denomination and amount.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
}

impl Coin {
    /// Create a coin, validating the denomination.
    pub fn new(denom: impl Into<String>, amount: Amount) -> Result<Self, TypeError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        Ok(Self { denom, amount })
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Validate a denomination string.
pub fn validate_denom(denom: &str) -> Result<(), TypeError> {
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));

    if !first_ok || !rest_ok || denom.len() < 3 || denom.len() > 128 {
        return Err(TypeError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

/// Sorted, de-duplicated set of non-zero coins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Empty set.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build from coins that must not repeat a denomination. Zero amounts are dropped.
    pub fn new(coins: Vec<Coin>) -> Result<Self, TypeError> {
        let mut by_denom = BTreeMap::new();
        for coin in coins {
            validate_denom(&coin.denom)?;
            if by_denom.insert(coin.denom.clone(), coin.amount).is_some() {
                return Err(TypeError::DuplicateDenom(coin.denom));
            }
        }
        Ok(Self::from_map(by_denom))
    }

    fn from_map(map: BTreeMap<String, Amount>) -> Self {
        Self(
            map.into_iter()
                .filter(|(_, amount)| *amount != 0)
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        )
    }

    /// Sum of two sets.
    pub fn checked_add(&self, other: &Coins) -> Result<Coins, TypeError> {
        let mut map: BTreeMap<String, Amount> = self
            .0
            .iter()
            .map(|c| (c.denom.clone(), c.amount))
            .collect();

        for coin in &other.0 {
            let entry = map.entry(coin.denom.clone()).or_insert(0);
            *entry = entry.checked_add(coin.amount).ok_or_else(|| TypeError::Overflow {
                denom: coin.denom.clone(),
            })?;
        }

        Ok(Self::from_map(map))
    }

    /// Add a single coin.
    pub fn checked_add_coin(&self, coin: &Coin) -> Result<Coins, TypeError> {
        self.checked_add(&Coins::from(coin.clone()))
    }

    /// Sum an iterator of sets.
    pub fn sum<'a>(sets: impl IntoIterator<Item = &'a Coins>) -> Result<Coins, TypeError> {
        sets.into_iter()
            .try_fold(Coins::empty(), |acc, coins| acc.checked_add(coins))
    }

    /// Amount held in `denom`, zero if absent.
    pub fn amount_of(&self, denom: &str) -> Amount {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        let mut map = BTreeMap::new();
        map.insert(coin.denom, coin.amount);
        Self::from_map(map)
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = TypeError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Coins::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(denom: &str, amount: Amount) -> Coin {
        Coin::new(denom, amount).unwrap()
    }

    #[test]
    fn test_coins_sorted_and_zero_dropped() {
        let coins = Coins::new(vec![coin("zeta", 5), coin("alpha", 0), coin("beta", 7)]).unwrap();

        let denoms: Vec<&str> = coins.iter().map(|c| c.denom.as_str()).collect();
        assert_eq!(denoms, vec!["beta", "zeta"]);
    }

    #[test]
    fn test_duplicate_denom_rejected() {
        let result = Coins::new(vec![coin("stake", 1), coin("stake", 2)]);
        assert_eq!(result, Err(TypeError::DuplicateDenom("stake".to_string())));
    }

    #[test]
    fn test_add_merges_denoms() {
        let a = Coins::new(vec![coin("stake", 10), coin("atom", 1)]).unwrap();
        let b = Coins::from(coin("stake", 5));

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.amount_of("stake"), 15);
        assert_eq!(sum.amount_of("atom"), 1);
        assert_eq!(sum.amount_of("missing"), 0);
    }

    #[test]
    fn test_overflow_detected() {
        let a = Coins::from(coin("stake", Amount::MAX));
        let b = Coins::from(coin("stake", 1));
        assert!(matches!(a.checked_add(&b), Err(TypeError::Overflow { .. })));
    }

    #[test]
    fn test_invalid_denoms() {
        assert!(Coin::new("1abc", 1).is_err());
        assert!(Coin::new("ab", 1).is_err());
        assert!(Coin::new("a b c", 1).is_err());
        assert!(Coin::new("ibc/27394FB092D2", 1).is_ok());
    }

    #[test]
    fn test_json_amount_is_string() {
        let coins = Coins::from(coin("stake", 10_000_000_000_000));
        let json = serde_json::to_string(&coins).unwrap();
        assert_eq!(json, r#"[{"denom":"stake","amount":"10000000000000"}]"#);

        let back: Coins = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coins);
    }

    #[test]
    fn test_unsorted_json_normalized_on_decode() {
        let json = r#"[{"denom":"zeta","amount":"1"},{"denom":"beta","amount":"2"}]"#;
        let coins: Coins = serde_json::from_str(json).unwrap();
        assert_eq!(coins.as_slice()[0].denom, "beta");
    }
}
