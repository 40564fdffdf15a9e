//! Cross rate derivation and the two linked amount fields

use super::currency::Currency;
use super::format::{format_amount, parse_amount};
use super::price::PriceMap;
use super::refresh::{PARTIAL_PRICES_WARNING, RefreshOutcome};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Units of `target` per unit of `source`, or `None` when either price is unknown.
pub fn rate(source: Currency, target: Currency, prices: &PriceMap) -> Option<f64> {
    let source_price = prices.price_of(source).filter(|p| p.is_finite() && *p > 0.0)?;
    let target_price = prices.price_of(target).filter(|p| p.is_finite() && *p > 0.0)?;
    Some(source_price / target_price)
}

/// One of the two linked amount fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmountField {
    /// Text as typed by the user or as formatted for display.
    pub text: String,
    /// Full-precision value backing `text`.
    pub value: Option<f64>,
}

impl AmountField {
    fn typed(text: &str) -> Self {
        Self {
            text: text.to_string(),
            value: parse_amount(text),
        }
    }

    /// `None` when the result overflowed to a non-finite value.
    fn computed(value: f64) -> Option<Self> {
        value.is_finite().then(|| Self {
            text: format_amount(value),
            value: Some(value),
        })
    }

    fn clear(&mut self) {
        self.text.clear();
        self.value = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    From,
    To,
}

/// Currently selected currencies and the two amount fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionState {
    pub source: Currency,
    pub target: Currency,
    pub from: AmountField,
    pub to: AmountField,
    /// Field the user edited last; the other one is derived from it.
    pub anchor: Side,
}

impl ConversionState {
    pub fn new(source: Currency, target: Currency, amount: &str) -> Result<Self> {
        if source == target {
            bail!("Source and target currency must differ, both are {}", source);
        }
        Ok(Self {
            source,
            target,
            from: AmountField::typed(amount),
            to: AmountField::default(),
            anchor: Side::From,
        })
    }

    fn swap(&mut self) {
        std::mem::swap(&mut self.source, &mut self.target);
        std::mem::swap(&mut self.from, &mut self.to);
        self.anchor = match self.anchor {
            Side::From => Side::To,
            Side::To => Side::From,
        };
    }
}

impl Default for ConversionState {
    fn default() -> Self {
        Self {
            source: Currency::BTC,
            target: Currency::USD,
            from: AmountField::typed("1"),
            to: AmountField::default(),
            anchor: Side::From,
        }
    }
}

/// Message shown next to the rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Some prices are missing; conversions needing them are unavailable.
    Warning(String),
    /// The last refresh failed entirely.
    Error(String),
}

/// Inputs driving the converter.
#[derive(Debug, Clone)]
pub enum Event {
    RefreshCompleted { ticket: u64, outcome: RefreshOutcome },
    SourceSelected(Currency),
    TargetSelected(Currency),
    FromEdited(String),
    ToEdited(String),
    SwapRequested,
}

/// Owns the price map and conversion state and applies events to them.
#[derive(Debug, Clone)]
pub struct Converter {
    prices: PriceMap,
    state: ConversionState,
    rate: Option<f64>,
    notice: Option<Notice>,
    updated_at: Option<DateTime<Utc>>,
    latest_ticket: u64,
    pending: bool,
}

impl Converter {
    pub fn new(state: ConversionState) -> Self {
        let mut converter = Self {
            prices: PriceMap::new(),
            state,
            rate: None,
            notice: None,
            updated_at: None,
            latest_ticket: 0,
            pending: false,
        };
        converter.recompute();
        converter
    }

    pub fn state(&self) -> &ConversionState {
        &self.state
    }

    pub fn prices(&self) -> &PriceMap {
        &self.prices
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_refreshing(&self) -> bool {
        self.pending
    }

    /// Currencies that may be picked as source without a swap.
    pub fn selectable_sources(&self) -> Vec<Currency> {
        Currency::ALL
            .into_iter()
            .filter(|c| *c != self.state.target)
            .collect()
    }

    /// Currencies that may be picked as target without a swap.
    pub fn selectable_targets(&self) -> Vec<Currency> {
        Currency::ALL
            .into_iter()
            .filter(|c| *c != self.state.source)
            .collect()
    }

    /// Marks a refresh as started and returns its ticket.
    ///
    /// Only the outcome carrying the latest ticket is applied, so an older
    /// refresh finishing late cannot overwrite newer prices.
    pub fn begin_refresh(&mut self) -> u64 {
        self.latest_ticket += 1;
        self.pending = true;
        self.latest_ticket
    }

    pub fn apply(&mut self, event: Event) {
        match event {
            Event::RefreshCompleted { ticket, outcome } => self.complete_refresh(ticket, outcome),
            Event::SourceSelected(currency) => {
                if currency == self.state.target {
                    self.state.swap();
                } else {
                    self.state.source = currency;
                    self.recompute();
                }
            }
            Event::TargetSelected(currency) => {
                if currency == self.state.source {
                    self.state.swap();
                } else {
                    self.state.target = currency;
                    self.recompute();
                }
            }
            Event::FromEdited(text) => {
                self.state.from = AmountField::typed(&text);
                self.state.anchor = Side::From;
                self.recompute();
            }
            Event::ToEdited(text) => {
                self.state.to = AmountField::typed(&text);
                self.state.anchor = Side::To;
                self.recompute();
            }
            Event::SwapRequested => self.state.swap(),
        }
        // Swapping keeps the numbers but the rate still has to follow the currencies.
        self.rate = rate(self.state.source, self.state.target, &self.prices);
    }

    fn complete_refresh(&mut self, ticket: u64, outcome: RefreshOutcome) {
        if ticket != self.latest_ticket {
            debug!(ticket, latest = self.latest_ticket, "Ignoring stale refresh");
            return;
        }
        self.pending = false;
        match outcome {
            RefreshOutcome::Settled {
                prices,
                failures,
                fetched_at,
            } => {
                self.prices = prices;
                self.updated_at = Some(fetched_at);
                self.notice = if failures.is_empty() {
                    None
                } else {
                    Some(Notice::Warning(PARTIAL_PRICES_WARNING.to_string()))
                };
            }
            RefreshOutcome::Failed { message } => {
                self.prices = PriceMap::new();
                self.notice = Some(Notice::Error(message));
            }
        }
        self.recompute();
    }

    /// Refreshes the rate and derives the non-anchor field from the anchor.
    fn recompute(&mut self) {
        self.rate = rate(self.state.source, self.state.target, &self.prices);
        let state = &mut self.state;
        match (state.anchor, self.rate) {
            (Side::From, Some(rate)) => {
                match state.from.value.and_then(|a| AmountField::computed(a * rate)) {
                    Some(field) => state.to = field,
                    None => state.to.clear(),
                }
            }
            (Side::To, Some(rate)) => {
                match state.to.value.and_then(|a| AmountField::computed(a / rate)) {
                    Some(field) => state.from = field,
                    None => state.from.clear(),
                }
            }
            (Side::From, None) => state.to.clear(),
            (Side::To, None) => state.from.clear(),
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConversionState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::refresh::PriceFailure;

    fn prices(entries: &[(Currency, f64)]) -> PriceMap {
        PriceMap::try_from(entries).unwrap()
    }

    fn settled(entries: &[(Currency, f64)], failed: &[Currency]) -> RefreshOutcome {
        RefreshOutcome::Settled {
            prices: prices(entries),
            failures: failed
                .iter()
                .map(|c| PriceFailure {
                    currency: *c,
                    reason: format!("Could not fetch the latest {c} price"),
                })
                .collect(),
            fetched_at: Utc::now(),
        }
    }

    fn converter_with(entries: &[(Currency, f64)], source: Currency, target: Currency) -> Converter {
        let mut converter = Converter::new(ConversionState::new(source, target, "1").unwrap());
        let ticket = converter.begin_refresh();
        converter.apply(Event::RefreshCompleted {
            ticket,
            outcome: settled(entries, &[]),
        });
        converter
    }

    #[test]
    fn test_rate_against_usd() {
        let map = prices(&[(Currency::BTC, 50000.0)]);
        assert_eq!(rate(Currency::USD, Currency::BTC, &map), Some(1.0 / 50000.0));
        assert_eq!(rate(Currency::BTC, Currency::USD, &map), Some(50000.0));
    }

    #[test]
    fn test_cross_rate() {
        let map = prices(&[(Currency::BTC, 60000.0), (Currency::ETH, 3000.0)]);
        assert_eq!(rate(Currency::BTC, Currency::ETH, &map), Some(20.0));
    }

    #[test]
    fn test_rate_unavailable_when_price_missing() {
        let map = prices(&[(Currency::BTC, 60000.0)]);
        assert_eq!(rate(Currency::BTC, Currency::ETH, &map), None);
        assert_eq!(rate(Currency::LTC, Currency::USD, &map), None);
        assert_eq!(rate(Currency::BTC, Currency::ETH, &PriceMap::new()), None);
    }

    #[test]
    fn test_state_rejects_same_currencies() {
        assert!(ConversionState::new(Currency::ETH, Currency::ETH, "1").is_err());
    }

    #[test]
    fn test_edit_from_computes_to() {
        let mut converter = converter_with(
            &[(Currency::BTC, 60000.0), (Currency::ETH, 3000.0)],
            Currency::BTC,
            Currency::ETH,
        );
        assert_eq!(converter.rate(), Some(20.0));

        converter.apply(Event::FromEdited("2".to_string()));

        assert_eq!(converter.state().to.text, "40");
        assert_eq!(converter.state().to.value, Some(40.0));
    }

    #[test]
    fn test_small_amount_to_usd_is_trimmed() {
        let mut converter =
            converter_with(&[(Currency::BTC, 45000.0)], Currency::BTC, Currency::USD);

        converter.apply(Event::FromEdited("0.001".to_string()));

        assert_eq!(converter.state().to.text, "45");
    }

    #[test]
    fn test_edit_to_computes_from() {
        let mut converter =
            converter_with(&[(Currency::BTC, 60000.0)], Currency::BTC, Currency::USD);

        converter.apply(Event::ToEdited("1".to_string()));

        assert_eq!(converter.state().from.text, "0.00001667");
        assert_eq!(converter.state().anchor, Side::To);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let mut converter = converter_with(
            &[(Currency::XMR, 163.37), (Currency::LTC, 71.9)],
            Currency::XMR,
            Currency::LTC,
        );
        converter.apply(Event::FromEdited("3.14159".to_string()));
        let to_value = converter.state().to.value.unwrap();

        converter.apply(Event::ToEdited(to_value.to_string()));

        let from_value = converter.state().from.value.unwrap();
        assert!((from_value - 3.14159).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_input_clears_other_field() {
        let mut converter =
            converter_with(&[(Currency::BTC, 60000.0)], Currency::BTC, Currency::USD);
        assert_eq!(converter.state().to.text, "60000");

        converter.apply(Event::FromEdited("abc".to_string()));
        assert_eq!(converter.state().from.text, "abc");
        assert_eq!(converter.state().to.text, "");
        assert_eq!(converter.state().to.value, None);

        converter.apply(Event::ToEdited(String::new()));
        assert_eq!(converter.state().from.text, "");
    }

    #[test]
    fn test_overflowing_result_clears_other_field() {
        let mut converter =
            converter_with(&[(Currency::BTC, 60000.0)], Currency::BTC, Currency::USD);

        converter.apply(Event::FromEdited("1e305".to_string()));
        assert_eq!(converter.state().from.value, Some(1e305));
        assert_eq!(converter.state().to.text, "");
        assert_eq!(converter.state().to.value, None);

        converter.apply(Event::SwapRequested);
        assert_eq!(converter.state().from.text, "");
        assert_eq!(converter.state().from.value, None);
        assert_eq!(converter.state().to.text, "1e305");
    }

    #[test]
    fn test_unavailable_rate_clears_instead_of_computing() {
        let mut converter =
            converter_with(&[(Currency::BTC, 60000.0)], Currency::BTC, Currency::ETH);
        assert_eq!(converter.rate(), None);

        converter.apply(Event::FromEdited("2".to_string()));

        assert_eq!(converter.state().to.text, "");
        assert_eq!(converter.state().from.text, "2");
    }

    #[test]
    fn test_partial_refresh_scenario() {
        let mut converter = Converter::default();
        let ticket = converter.begin_refresh();
        converter.apply(Event::RefreshCompleted {
            ticket,
            outcome: settled(&[(Currency::BTC, 60000.0)], &[Currency::ETH]),
        });

        assert_eq!(
            converter.notice(),
            Some(&Notice::Warning(PARTIAL_PRICES_WARNING.to_string()))
        );
        assert_eq!(converter.prices().len(), 1);

        converter.apply(Event::TargetSelected(Currency::ETH));
        assert_eq!(converter.rate(), None);
        assert_eq!(converter.state().to.text, "");

        converter.apply(Event::TargetSelected(Currency::USD));
        assert_eq!(converter.rate(), Some(60000.0));
        assert_eq!(converter.state().to.text, "60000");
    }

    #[test]
    fn test_failed_refresh_clears_prices() {
        let mut converter =
            converter_with(&[(Currency::BTC, 60000.0)], Currency::BTC, Currency::USD);
        let ticket = converter.begin_refresh();
        converter.apply(Event::RefreshCompleted {
            ticket,
            outcome: RefreshOutcome::Failed {
                message: "network down".to_string(),
            },
        });

        assert!(converter.prices().is_empty());
        assert_eq!(converter.rate(), None);
        assert_eq!(
            converter.notice(),
            Some(&Notice::Error("network down".to_string()))
        );
        assert_eq!(converter.state().to.text, "");
    }

    #[test]
    fn test_refresh_replaces_previous_map() {
        let mut converter = converter_with(
            &[(Currency::BTC, 60000.0), (Currency::ETH, 3000.0)],
            Currency::BTC,
            Currency::USD,
        );
        let ticket = converter.begin_refresh();
        converter.apply(Event::RefreshCompleted {
            ticket,
            outcome: settled(&[(Currency::BTC, 61000.0)], &[Currency::ETH]),
        });

        assert_eq!(converter.prices().price_of(Currency::ETH), None);
        assert_eq!(converter.state().to.text, "61000");
    }

    #[test]
    fn test_stale_refresh_is_ignored() {
        let mut converter = Converter::default();
        let first = converter.begin_refresh();
        let second = converter.begin_refresh();

        converter.apply(Event::RefreshCompleted {
            ticket: second,
            outcome: settled(&[(Currency::BTC, 61000.0)], &[]),
        });
        converter.apply(Event::RefreshCompleted {
            ticket: first,
            outcome: settled(&[(Currency::BTC, 59000.0)], &[]),
        });

        assert_eq!(converter.prices().price_of(Currency::BTC), Some(61000.0));
        assert!(!converter.is_refreshing());
    }

    #[test]
    fn test_swap_exchanges_values_without_recomputing() {
        let mut converter =
            converter_with(&[(Currency::BTC, 60000.0)], Currency::BTC, Currency::USD);
        assert_eq!(converter.state().from.text, "1");
        assert_eq!(converter.state().to.text, "60000");

        converter.apply(Event::SwapRequested);

        let state = converter.state();
        assert_eq!(state.source, Currency::USD);
        assert_eq!(state.target, Currency::BTC);
        assert_eq!(state.from.text, "60000");
        assert_eq!(state.to.text, "1");
        assert_eq!(converter.rate(), Some(1.0 / 60000.0));
    }

    #[test]
    fn test_selecting_counterpart_swaps() {
        let mut converter =
            converter_with(&[(Currency::BTC, 60000.0)], Currency::BTC, Currency::USD);

        converter.apply(Event::TargetSelected(Currency::BTC));
        assert_eq!(converter.state().source, Currency::USD);
        assert_eq!(converter.state().target, Currency::BTC);
        assert_eq!(converter.state().from.text, "60000");

        converter.apply(Event::SourceSelected(Currency::BTC));
        assert_eq!(converter.state().source, Currency::BTC);
        assert_eq!(converter.state().target, Currency::USD);
        assert_eq!(converter.state().from.text, "1");
    }

    #[test]
    fn test_source_never_equals_target() {
        let mut converter = Converter::default();
        let sequence = [
            Event::TargetSelected(Currency::BTC),
            Event::SourceSelected(Currency::ETH),
            Event::TargetSelected(Currency::ETH),
            Event::SwapRequested,
            Event::SourceSelected(Currency::XMR),
            Event::TargetSelected(Currency::LTC),
            Event::SourceSelected(Currency::LTC),
        ];
        for event in sequence {
            converter.apply(event);
            assert_ne!(converter.state().source, converter.state().target);
        }
    }

    #[test]
    fn test_selectable_lists_exclude_counterpart() {
        let converter = Converter::default();
        assert!(!converter.selectable_sources().contains(&Currency::USD));
        assert!(!converter.selectable_targets().contains(&Currency::BTC));
        assert_eq!(converter.selectable_sources().len(), 4);
    }
}
