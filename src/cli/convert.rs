use super::{rate_line, refresh, ui};
use crate::core::conversion::ConversionState;
use crate::core::{Converter, Currency, Event, Notice, PriceProvider};
use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::debug;

/// A one-shot conversion request.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub amount: String,
    pub from: Option<Currency>,
    pub to: Option<Currency>,
    /// Treat `amount` as the target amount and solve for the source.
    pub reverse: bool,
}

/// Applies the currency choices of `request` on top of the configured defaults.
pub fn select_currencies(converter: &mut Converter, request: &ConvertRequest) -> Result<()> {
    if let (Some(from), Some(to)) = (request.from, request.to) {
        if from == to {
            bail!("Source and target currency must differ, both are {}", from);
        }
    }
    if let Some(from) = request.from {
        converter.apply(Event::SourceSelected(from));
    }
    if let Some(to) = request.to {
        converter.apply(Event::TargetSelected(to));
    }
    Ok(())
}

/// Enters the amount and renders the result, failing when no conversion is possible.
pub fn convert(converter: &mut Converter, request: &ConvertRequest) -> Result<String> {
    if request.reverse {
        converter.apply(Event::ToEdited(request.amount.clone()));
    } else {
        converter.apply(Event::FromEdited(request.amount.clone()));
    }

    let state = converter.state();
    if converter.rate().is_none() {
        let reason = match converter.notice() {
            Some(Notice::Error(message)) => message.clone(),
            _ => "price unavailable".to_string(),
        };
        bail!(
            "Cannot convert {} to {}: {}",
            state.source,
            state.target,
            reason
        );
    }
    let (Some(_), Some(_)) = (state.from.value, state.to.value) else {
        bail!("Invalid amount: {:?}", request.amount);
    };
    debug!(?state, "Conversion complete");

    let mut output = format!(
        "{} {} = {} {}\n{}",
        state.from.text,
        state.source,
        ui::style_text(&state.to.text, ui::StyleType::Value),
        state.target,
        ui::style_text(&rate_line(converter), ui::StyleType::Subtle)
    );
    if let Some(Notice::Warning(message)) = converter.notice() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(message, ui::StyleType::Warning)
        ));
    }
    Ok(output)
}

pub async fn run(
    provider: Arc<dyn PriceProvider>,
    initial: ConversionState,
    request: &ConvertRequest,
) -> Result<()> {
    let mut converter = Converter::new(initial);
    select_currencies(&mut converter, request)?;
    refresh(&mut converter, &provider).await;
    println!("{}", convert(&mut converter, request)?);
    Ok(())
}
