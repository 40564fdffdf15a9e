//! Concurrent refresh of USD prices for all supported crypto currencies

use super::currency::Currency;
use super::price::{PriceMap, PriceProvider};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

pub const PARTIAL_PRICES_WARNING: &str =
    "Could not fetch all crypto prices. Some conversions may not be available.";

/// A currency whose price could not be fetched in a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFailure {
    pub currency: Currency,
    pub reason: String,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Every fetch settled. `failures` lists the currencies missing from `prices`.
    Settled {
        prices: PriceMap,
        failures: Vec<PriceFailure>,
        fetched_at: DateTime<Utc>,
    },
    /// The batch itself broke down; no prices are usable.
    Failed { message: String },
}

impl RefreshOutcome {
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            RefreshOutcome::Settled { failures, .. } if !failures.is_empty() => {
                Some(PARTIAL_PRICES_WARNING)
            }
            _ => None,
        }
    }
}

/// Fetches prices for `currencies` concurrently and waits for all of them to settle.
///
/// A failing currency never blocks the others. Only a broken fetch task (panic
/// or cancellation) fails the whole batch.
#[instrument(name = "RefreshPrices", skip(provider), fields(count = currencies.len()))]
pub async fn refresh_prices(
    provider: Arc<dyn PriceProvider>,
    currencies: &[Currency],
) -> RefreshOutcome {
    match fetch_all(provider, currencies).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Price refresh failed");
            RefreshOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}

async fn fetch_all(
    provider: Arc<dyn PriceProvider>,
    currencies: &[Currency],
) -> Result<RefreshOutcome> {
    let handles = currencies
        .iter()
        .filter(|c| !c.is_usd())
        .map(|&currency| {
            let provider = Arc::clone(&provider);
            let handle = tokio::spawn(async move { provider.fetch_price(currency).await });
            (currency, handle)
        })
        .collect::<Vec<_>>();

    let (order, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let results = join_all(handles).await;

    let mut prices = PriceMap::new();
    let mut failures = Vec::new();
    for (currency, joined) in order.into_iter().zip(results) {
        let fetched =
            joined.map_err(|e| anyhow!("Price fetch task for {} did not finish: {}", currency, e))?;
        match fetched.and_then(|price| prices.insert(currency, price)) {
            Ok(()) => debug!(%currency, "Price fetched"),
            Err(e) => {
                warn!(%currency, error = %e, "Failed to fetch price");
                failures.push(PriceFailure {
                    currency,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(RefreshOutcome::Settled {
        prices,
        failures,
        fetched_at: Utc::now(),
    })
}
