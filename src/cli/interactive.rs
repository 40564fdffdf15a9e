//! Line-oriented prompt driving a [`Converter`] the way the widget's controls would.

use super::{refresh, render_state, ui};
use crate::core::{Converter, Currency, Event, PriceProvider};
use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub const HELP: &str = "\
Commands:
  from <amount>     set the amount you send
  to <amount>       set the amount they receive
  source <SYMBOL>   select the currency you send
  target <SYMBOL>   select the currency they receive
  swap              swap currencies and amounts
  refresh           fetch the latest prices
  show              print the current conversion
  help              print this help
  quit              exit";

#[derive(Debug, Clone)]
pub enum Command {
    Apply(Event),
    Refresh,
    Show,
    Help,
    Quit,
}

/// Parses one prompt line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(k, r)| (k, r.trim()));

    let command = match keyword.to_lowercase().as_str() {
        "from" => Command::Apply(Event::FromEdited(rest.to_string())),
        "to" => Command::Apply(Event::ToEdited(rest.to_string())),
        "source" => Command::Apply(Event::SourceSelected(parse_currency(rest)?)),
        "target" => Command::Apply(Event::TargetSelected(parse_currency(rest)?)),
        "swap" => Command::Apply(Event::SwapRequested),
        "refresh" => Command::Refresh,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("Unknown command: {}. Type 'help' for a list of commands", other),
    };
    Ok(Some(command))
}

fn parse_currency(text: &str) -> Result<Currency> {
    if text.is_empty() {
        return Err(anyhow!(
            "Missing currency, expected one of: {}",
            Currency::ALL.map(|c| c.symbol()).join(", ")
        ));
    }
    text.parse()
}

/// Runs the prompt until `quit` or end of input.
pub async fn run<R, W>(
    provider: Arc<dyn PriceProvider>,
    mut converter: Converter,
    input: R,
    output: &mut W,
) -> Result<Converter>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    refresh(&mut converter, &provider).await;
    writeln!(output, "{}", render_state(&converter)).context("Failed to write output")?;

    let mut lines = input.lines();
    loop {
        write!(output, "> ").context("Failed to write output")?;
        output.flush().context("Failed to flush output")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(output, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))
                    .context("Failed to write output")?;
                continue;
            }
        };
        debug!(?command, "Handling command");

        match command {
            Command::Apply(event) => converter.apply(event),
            Command::Refresh => refresh(&mut converter, &provider).await,
            Command::Show => {}
            Command::Help => {
                writeln!(output, "{HELP}").context("Failed to write output")?;
                continue;
            }
            Command::Quit => break,
        }
        writeln!(output, "{}", render_state(&converter)).context("Failed to write output")?;
    }

    Ok(converter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::refresh::tests::MockPriceProvider;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_parse_commands() {
        assert!(parse_command("   ").unwrap().is_none());
        assert!(matches!(
            parse_command("from 2.5").unwrap(),
            Some(Command::Apply(Event::FromEdited(ref s))) if s == "2.5"
        ));
        assert!(matches!(
            parse_command("TO").unwrap(),
            Some(Command::Apply(Event::ToEdited(ref s))) if s.is_empty()
        ));
        assert!(matches!(
            parse_command("target eth").unwrap(),
            Some(Command::Apply(Event::TargetSelected(Currency::ETH)))
        ));
        assert!(matches!(
            parse_command("swap").unwrap(),
            Some(Command::Apply(Event::SwapRequested))
        ));
        assert!(matches!(parse_command("exit").unwrap(), Some(Command::Quit)));
        assert!(parse_command("source").is_err());
        assert!(parse_command("source DOGE").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[tokio::test]
    async fn test_session_swaps_and_refreshes() {
        let mock = Arc::new(MockPriceProvider::new(&[(Currency::BTC, 60000.0)]));
        let provider: Arc<dyn PriceProvider> = mock.clone();
        let script = "from 1\nswap\nbogus\nrefresh\nquit\nfrom 5\n";
        let mut output = Vec::new();

        let converter = run(provider, Converter::default(), script.as_bytes(), &mut output)
            .await
            .unwrap();

        let state = converter.state();
        assert_eq!(state.source, Currency::USD);
        assert_eq!(state.target, Currency::BTC);
        assert_eq!(state.from.text, "60000");
        assert_eq!(state.to.text, "1");
        // Two refreshes of four currencies each.
        assert_eq!(mock.call_count.load(Ordering::SeqCst), 8);

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Unknown command: bogus"));
        assert!(printed.contains("Some conversions may not be available"));
    }

    #[tokio::test]
    async fn test_session_ends_at_end_of_input() {
        let provider: Arc<dyn PriceProvider> =
            Arc::new(MockPriceProvider::new(&[(Currency::ETH, 3000.0)]));
        let mut output = Vec::new();

        let converter = run(
            provider,
            Converter::default(),
            "target eth\nsource usd\nto 2\n".as_bytes(),
            &mut output,
        )
        .await
        .unwrap();

        let state = converter.state();
        assert_eq!(state.source, Currency::USD);
        assert_eq!(state.target, Currency::ETH);
        assert_eq!(state.from.text, "6000");
    }
}
