use super::ui;
use crate::core::{Currency, PriceProvider, RefreshOutcome, refresh_prices};
use anyhow::{Result, bail};
use comfy_table::{Cell, Color};
use std::sync::Arc;

/// Builds the price table for a settled refresh.
pub fn display_prices(outcome: &RefreshOutcome) -> Result<String> {
    let (prices, failures, fetched_at) = match outcome {
        RefreshOutcome::Settled {
            prices,
            failures,
            fetched_at,
        } => (prices, failures, fetched_at),
        RefreshOutcome::Failed { message } => bail!("Price refresh failed: {}", message),
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Name"),
        ui::header_cell("Price (USD)"),
        ui::header_cell("Note"),
    ]);

    for currency in Currency::CRYPTOS {
        let price = ui::format_optional_cell(prices.price_of(currency), |p| format!("{p:.2}"));
        let note = failures
            .iter()
            .find(|f| f.currency == currency)
            .map_or(Cell::new(""), |f| Cell::new(&f.reason).fg(Color::Red));
        table.add_row(vec![
            Cell::new(currency.symbol()),
            Cell::new(currency.name()),
            price,
            note,
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Crypto prices in USD", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{}",
        ui::style_text(
            &format!("Updated {}", fetched_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ui::StyleType::Subtle
        )
    ));

    if let Some(warning) = outcome.warning() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(warning, ui::StyleType::Warning)
        ));
    }

    Ok(output)
}

pub async fn run(provider: Arc<dyn PriceProvider>) -> Result<()> {
    let spinner = ui::new_spinner("Fetching prices...");
    let outcome = refresh_prices(provider, &Currency::CRYPTOS).await;
    spinner.finish_and_clear();

    println!("{}", display_prices(&outcome)?);
    Ok(())
}
