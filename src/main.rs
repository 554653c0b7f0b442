use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shop_checkout::config::load_config;
use shop_checkout::logging::init_tracing;
use shop_checkout::quote::QuoteInput;
use shop_checkout::server::run_http_server;

/// Bundle-priced Stripe checkout service
#[derive(Parser)]
#[command(name = "shop-checkout")]
#[command(about = "Quotes bundle pricing and opens hosted Stripe checkout sessions.")]
#[command(version)]
struct Cli {
    /// Configuration file layered over `config.*` and defaults
    #[arg(short, long, env = "CHECKOUT_CONFIG")]
    config: Option<PathBuf>,
    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print the quote for a quantity without contacting Stripe
    Quote {
        /// Number of units; values below 1 are priced as 1
        #[arg(short, long, default_value = "1", allow_hyphen_values = true)]
        quantity: String,
        /// ISO currency code; unknown codes are priced in usd
        #[arg(short, long, default_value = "usd")]
        currency: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Serve => {
            run_http_server(config).await.context("server failed")?;
        }
        Commands::Quote { quantity, currency } => {
            let input = QuoteInput::from_raw(
                Some(&serde_json::Value::String(quantity)),
                Some(&serde_json::Value::String(currency)),
            );
            let quote = config.catalog.quote_builder().build_from(&input);
            println!("{}", serde_json::to_string_pretty(&quote)?);
            println!("total: {}", quote.total_amount());
        }
    }

    Ok(())
}
