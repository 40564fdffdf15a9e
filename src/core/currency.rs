//! Supported currencies

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[allow(clippy::upper_case_acronyms)]
pub enum Currency {
    BTC,
    ETH,
    LTC,
    XMR,
    USD,
}

impl Currency {
    /// Every supported currency, in display order.
    pub const ALL: [Currency; 5] = [
        Currency::BTC,
        Currency::ETH,
        Currency::LTC,
        Currency::XMR,
        Currency::USD,
    ];

    /// Currencies whose USD price has to be fetched.
    pub const CRYPTOS: [Currency; 4] = [Currency::BTC, Currency::ETH, Currency::LTC, Currency::XMR];

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::BTC => "BTC",
            Currency::ETH => "ETH",
            Currency::LTC => "LTC",
            Currency::XMR => "XMR",
            Currency::USD => "USD",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Currency::BTC => "Bitcoin",
            Currency::ETH => "Ethereum",
            Currency::LTC => "Litecoin",
            Currency::XMR => "Monero",
            Currency::USD => "US Dollar",
        }
    }

    pub fn is_usd(&self) -> bool {
        *self == Currency::USD
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BTC" => Ok(Currency::BTC),
            "ETH" => Ok(Currency::ETH),
            "LTC" => Ok(Currency::LTC),
            "XMR" => Ok(Currency::XMR),
            "USD" => Ok(Currency::USD),
            _ => Err(anyhow::anyhow!("Unsupported currency: {}", s)),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> String {
        currency.symbol().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("btc".parse::<Currency>().unwrap(), Currency::BTC);
        assert_eq!(" Xmr ".parse::<Currency>().unwrap(), Currency::XMR);
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::USD);
    }

    #[test]
    fn test_parse_unknown_symbol_fails() {
        let err = "DOGE".parse::<Currency>().unwrap_err();
        assert!(err.to_string().contains("DOGE"));
    }

    #[test]
    fn test_cryptos_exclude_usd() {
        assert!(Currency::CRYPTOS.iter().all(|c| !c.is_usd()));
        assert_eq!(Currency::ALL.len(), Currency::CRYPTOS.len() + 1);
    }

    #[test]
    fn test_yaml_round_trip_uses_symbol() {
        let yaml = serde_yaml::to_string(&Currency::LTC).unwrap();
        assert_eq!(yaml.trim(), "LTC");
        let parsed: Currency = serde_yaml::from_str("eth").unwrap();
        assert_eq!(parsed, Currency::ETH);
    }
}
