//! Pricing abstractions and core types

use super::currency::Currency;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Source of live USD prices.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Returns the USD price of one unit of `currency`.
    async fn fetch_price(&self, currency: Currency) -> Result<f64>;
}

/// USD prices known from the most recent refresh.
///
/// Entries are absent for currencies whose fetch failed. USD is never stored
/// since its price is always 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceMap {
    prices: BTreeMap<Currency, f64>,
}

impl PriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, currency: Currency, price: f64) -> Result<()> {
        if currency.is_usd() {
            bail!("USD price is fixed and cannot be set");
        }
        if !price.is_finite() || price <= 0.0 {
            bail!("Invalid price {} for {}", price, currency);
        }
        self.prices.insert(currency, price);
        Ok(())
    }

    /// USD price of `currency`, if known.
    pub fn price_of(&self, currency: Currency) -> Option<f64> {
        if currency.is_usd() {
            return Some(1.0);
        }
        self.prices.get(&currency).copied()
    }

    pub fn contains(&self, currency: Currency) -> bool {
        currency.is_usd() || self.prices.contains_key(&currency)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.prices.iter().map(|(c, p)| (*c, *p))
    }
}

impl TryFrom<&[(Currency, f64)]> for PriceMap {
    type Error = anyhow::Error;

    fn try_from(entries: &[(Currency, f64)]) -> Result<Self> {
        let mut map = PriceMap::new();
        for (currency, price) in entries {
            map.insert(*currency, *price)?;
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_is_always_one() {
        let map = PriceMap::new();
        assert_eq!(map.price_of(Currency::USD), Some(1.0));
        assert!(map.contains(Currency::USD));
        assert!(map.is_empty());
    }

    #[test]
    fn test_insert_rejects_invalid_prices() {
        let mut map = PriceMap::new();
        assert!(map.insert(Currency::USD, 1.0).is_err());
        assert!(map.insert(Currency::BTC, 0.0).is_err());
        assert!(map.insert(Currency::BTC, -5.0).is_err());
        assert!(map.insert(Currency::BTC, f64::NAN).is_err());
        assert!(map.insert(Currency::BTC, f64::INFINITY).is_err());
        assert!(map.is_empty());
    }

    #[test]
    fn test_missing_entry_is_none() {
        let map = PriceMap::try_from(&[(Currency::BTC, 60000.0)][..]).unwrap();
        assert_eq!(map.price_of(Currency::BTC), Some(60000.0));
        assert_eq!(map.price_of(Currency::ETH), None);
        assert_eq!(map.len(), 1);
    }
}
