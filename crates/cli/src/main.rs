//! Emerald Market CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog, cheapest first
//! emerald browse --category Electronics --sort price-asc
//!
//! # Search with a price range
//! emerald browse --query wireless --max-price 100
//!
//! # Show the sale page
//! emerald sale --percent 25
//!
//! # Run a full checkout from an order file
//! emerald checkout order.yaml
//!
//! # Inspect orders on the remote data service
//! emerald remote orders
//! emerald remote set-status 0b6f1a2c-3d4e-4f50-8a9b-0c1d2e3f4a5b shipped
//! ```
//!
//! # Commands
//!
//! - `browse` - Filter and sort the catalog
//! - `categories` - List categories with product counts
//! - `sale` - Show every product at its sale price
//! - `checkout` - Place an order described in a YAML file
//! - `remote` - Query products and manage orders on the data service

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use emerald_core::{OrderStatus, Price};
use emerald_storefront::config::StorefrontConfig;
use emerald_storefront::filter::SortKey;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "emerald")]
#[command(author, version, about = "Emerald Market terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter and sort the catalog
    Browse(BrowseArgs),
    /// List categories with product counts
    Categories,
    /// Show every product at its sale price
    Sale {
        /// Percent off (defaults to `EMERALD_SALE_PERCENT`, then 30)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: Option<u8>,
    },
    /// Place an order described in a YAML file
    Checkout {
        /// Order file with items, shipping and payment details
        order: PathBuf,

        /// Also store the order on the remote data service
        #[arg(long)]
        submit: bool,

        /// Print the confirmation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query products and manage orders on the data service
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Args)]
struct BrowseArgs {
    /// Text to find in product names and descriptions
    #[arg(short, long)]
    query: Option<String>,

    /// Exact category name
    #[arg(short, long)]
    category: Option<String>,

    /// Lowest price to include
    #[arg(long)]
    min_price: Option<Price>,

    /// Highest price to include
    #[arg(long)]
    max_price: Option<Price>,

    /// Result order (`price-asc`, `price-desc`, `newest`)
    #[arg(short, long, default_value_t = SortKey::CatalogOrder)]
    sort: SortKey,
}

#[derive(Subcommand)]
enum RemoteAction {
    /// List products, newest first
    Products {
        /// Text to find in product names and descriptions
        #[arg(short, long, conflicts_with = "category")]
        search: Option<String>,

        /// Exact category name
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List orders, newest first
    Orders,
    /// Show one order with its items
    Order {
        /// Order ID
        id: Uuid,
    },
    /// Change an order's status
    SetStatus {
        /// Order ID
        id: Uuid,

        /// New status (`pending`, `processing`, `shipped`, `delivered`, `cancelled`)
        status: OrderStatus,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.sentry.environment.clone().into()),
            sample_rate: config.sentry.sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr so command output stays clean.
fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emerald_storefront=info,emerald_cli=info".into());

    let json = std::env::var("EMERALD_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let cli = Cli::parse();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(CommandError::from(e)),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CommandError> {
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Browse(args) => {
            let catalog = config.load_catalog()?;
            let spec = emerald_storefront::filter::FilterSpec {
                query: args.query,
                category: args.category,
                min_price: args.min_price,
                max_price: args.max_price,
            };
            commands::browse::browse(&catalog, &spec, args.sort, &mut out)?;
        }
        Commands::Categories => {
            let catalog = config.load_catalog()?;
            commands::browse::categories(&catalog, &mut out)?;
        }
        Commands::Sale { percent } => {
            let catalog = config.load_catalog()?;
            let percent = percent.unwrap_or(config.sale_percent);
            commands::browse::sale(&catalog, percent, &mut out)?;
        }
        Commands::Checkout {
            order,
            submit,
            json,
        } => {
            let options = commands::checkout::CheckoutOptions { submit, json };
            commands::checkout::run(&config, &order, options, &mut out).await?;
        }
        Commands::Remote { action } => {
            commands::remote::run(&config, action, &mut out).await?;
        }
    }
    Ok(())
}
