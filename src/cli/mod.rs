pub mod convert;
pub mod interactive;
pub mod prices;
pub mod setup;
pub mod ui;

use crate::core::format::format_amount;
use crate::core::{Converter, Currency, Event, Notice, PriceProvider, refresh_prices};
use std::sync::Arc;

/// Runs one refresh cycle against `provider` and feeds the outcome to `converter`.
pub async fn refresh(converter: &mut Converter, provider: &Arc<dyn PriceProvider>) {
    let ticket = converter.begin_refresh();
    let spinner = ui::new_spinner("Fetching prices...");
    let outcome = refresh_prices(Arc::clone(provider), &Currency::CRYPTOS).await;
    spinner.finish_and_clear();
    converter.apply(Event::RefreshCompleted { ticket, outcome });
}

/// Human readable rate line, e.g. `1 BTC = 60000 USD`.
pub fn rate_line(converter: &Converter) -> String {
    let state = converter.state();
    match converter.rate() {
        Some(rate) => format!(
            "1 {} = {} {}",
            state.source,
            format_amount(rate),
            state.target
        ),
        None if converter.is_refreshing() => "Fetching price...".to_string(),
        None => "Price unavailable".to_string(),
    }
}

/// Renders the converter the way the interactive prompt shows it.
pub fn render_state(converter: &Converter) -> String {
    let state = converter.state();
    let mut lines = vec![
        format!(
            "{} {} -> {} {}",
            ui::style_text(state.source.symbol(), ui::StyleType::Title),
            ui::style_text(&format!("({})", state.source.name()), ui::StyleType::Subtle),
            ui::style_text(state.target.symbol(), ui::StyleType::Title),
            ui::style_text(&format!("({})", state.target.name()), ui::StyleType::Subtle),
        ),
        format!(
            "  {} {} {}",
            ui::style_text("You send:    ", ui::StyleType::Label),
            ui::style_text(&state.from.text, ui::StyleType::Value),
            state.source
        ),
        format!(
            "  {} {} {}",
            ui::style_text("They receive:", ui::StyleType::Label),
            ui::style_text(&state.to.text, ui::StyleType::Value),
            state.target
        ),
        format!(
            "  {} {}",
            ui::style_text("Rate:        ", ui::StyleType::Label),
            rate_line(converter)
        ),
    ];

    if let Some(updated_at) = converter.updated_at() {
        lines.push(ui::style_text(
            &format!("  Updated {}", updated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ui::StyleType::Subtle,
        ));
    }

    match converter.notice() {
        Some(Notice::Warning(message)) => {
            lines.push(format!("  {}", ui::style_text(message, ui::StyleType::Warning)))
        }
        Some(Notice::Error(message)) => {
            lines.push(format!("  {}", ui::style_text(message, ui::StyleType::Error)))
        }
        None => {}
    }

    lines.join("\n")
}
