//! # hms-quote
//!
//! Command line front end for the HMS subscription marketplace.
//!
//! ```text
//! hms-quote catalog
//! hms-quote price --module patient-records --module billing --coupon WELCOME10
//! hms-quote price --mode distributor --plan professional --coupon DIST10
//! hms-quote quote --module lab-results --name "Dr. Okafor" --email amara@clinic.example
//! hms-quote checkout --mode distributor --plan starter --free-trial
//! ```
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()          RUST_LOG, default "warn,hms_checkout=info"  │
//! │  2. EngineConfig::load()    defaults → TOML → HMS_* env → validate      │
//! │  3. config.catalog()        configured catalog or the seeded default    │
//! │  4. run subcommand          one QuoteSession per invocation             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hms_checkout::EngineConfig;
use hms_core::PricingMode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Price HMS modules and distributor plans, download quotes, check out.
#[derive(Debug, Parser)]
#[command(name = "hms-quote", version, about)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "HMS_CONFIG")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List modules by category and distributor plans
    Catalog {
        /// Only show one side of the marketplace
        #[arg(long)]
        mode: Option<PricingMode>,
    },

    /// Show the pricing summary for a selection
    Price(SelectionArgs),

    /// Generate a quote for a selection
    Quote {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        party: PartyArgs,

        /// Mark the quote as a free-trial quote
        #[arg(long)]
        free_trial: bool,
    },

    /// Activate a trial or start billing for a selection
    Checkout {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Activate a free trial instead of billing
        #[arg(long)]
        free_trial: bool,
    },
}

/// What is being bought.
#[derive(Debug, Clone, Args)]
struct SelectionArgs {
    /// customer or distributor (defaults to the configured mode)
    #[arg(long)]
    mode: Option<PricingMode>,

    /// Module id to select (customer mode, repeatable)
    #[arg(long = "module", short = 'm')]
    modules: Vec<String>,

    /// Plan id to select (distributor mode)
    #[arg(long)]
    plan: Option<String>,

    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,
}

/// Who the quote is for.
#[derive(Debug, Clone, Args)]
struct PartyArgs {
    /// Contact name
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    /// Customer organization (customer mode)
    #[arg(long)]
    organization: Option<String>,

    /// Company name (distributor mode)
    #[arg(long)]
    company: Option<String>,

    /// Sales region (distributor mode)
    #[arg(long)]
    region: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.clone())?;
    debug!(
        coupon_policy = %config.pricing.coupon_policy,
        quote_numbers = %config.pricing.quote_numbers,
        "Configuration loaded"
    );

    match cli.command {
        Command::Catalog { mode } => commands::catalog(&config, mode, cli.json)?,
        Command::Price(selection) => commands::price(&config, &selection, cli.json)?,
        Command::Quote {
            selection,
            party,
            free_trial,
        } => commands::quote(&config, &selection, &party, free_trial, cli.json).await?,
        Command::Checkout {
            selection,
            free_trial,
        } => commands::checkout(&config, &selection, free_trial, cli.json).await?,
    }

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=hms_checkout=trace` - Trace the session only
///
/// Logs go to stderr so `--json` output stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,hms_checkout=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
