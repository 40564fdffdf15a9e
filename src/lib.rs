pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::convert::ConvertRequest;
use crate::core::{Converter, PriceProvider};
use crate::core::config::AppConfig;
use crate::providers::GeminiPriceProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Prices,
    Convert(ConvertRequest),
    Interactive,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Crypto converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        base_url = %config.providers.gemini.base_url,
        model = %config.providers.gemini.model,
        defaults = ?config.defaults,
        "Loaded config"
    );

    let provider: Arc<dyn PriceProvider> =
        Arc::new(GeminiPriceProvider::from_config(&config.providers.gemini)?);
    let initial = config.defaults.initial_state()?;

    match command {
        AppCommand::Prices => cli::prices::run(provider).await,
        AppCommand::Convert(request) => cli::convert::run(provider, initial, &request).await,
        AppCommand::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            cli::interactive::run(provider, Converter::new(initial), stdin, &mut stdout)
                .await
                .map(|_| ())
        }
    }
}
