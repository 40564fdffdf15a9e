use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinconv::cli::convert::ConvertRequest;
use coinconv::core::Currency;
use coinconv::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the latest USD prices
    Prices,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        #[arg(allow_negative_numbers = true)]
        amount: String,
        /// Currency to convert from (BTC, ETH, LTC, XMR, USD)
        #[arg(short, long)]
        from: Option<Currency>,
        /// Currency to convert to (BTC, ETH, LTC, XMR, USD)
        #[arg(short, long)]
        to: Option<Currency>,
        /// Treat the amount as what should be received
        #[arg(short, long)]
        reverse: bool,
    },
    /// Start an interactive converter prompt
    Interactive,
}

impl From<Commands> for coinconv::AppCommand {
    fn from(cmd: Commands) -> coinconv::AppCommand {
        match cmd {
            Commands::Prices => coinconv::AppCommand::Prices,
            Commands::Convert {
                amount,
                from,
                to,
                reverse,
            } => coinconv::AppCommand::Convert(ConvertRequest {
                amount,
                from,
                to,
                reverse,
            }),
            Commands::Interactive => coinconv::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinconv::cli::setup::setup(),
        Some(cmd) => coinconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
