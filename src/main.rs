//! Cross-Venue Hedger - Main Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cross_venue_hedger::config::{Config, ConfigSource, CsvTradeSource};
use cross_venue_hedger::exchange::nado::{JsonFileCache, MemoryCache, ProductIdCache};
use cross_venue_hedger::exchange::{NadoGatewayClient, PriceOracle, ProductType, VenueRegistry};
use cross_venue_hedger::strategy::{Method, OrderExecutor, TradeStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Cross-Venue Hedger CLI
#[derive(Parser)]
#[command(name = "cross-venue-hedger")]
#[command(version, about = "Limit order on one venue, market hedge on another")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the first trade in the trades file
    Run {
        /// Side taken on the primary venue
        #[arg(short, long, value_enum, default_value_t = Method::LongPrimary)]
        method: Method,

        /// Trades CSV (overrides `trades_path`)
        #[arg(short, long)]
        trades: Option<String>,
    },

    /// Fetch a quote from the price oracle
    Quote {
        #[arg(short, long)]
        symbol: String,

        /// Query the spot market instead of the perp
        #[arg(long)]
        spot: bool,
    },

    /// Show positions on every configured venue
    Position {
        #[arg(short, long)]
        symbol: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let config = Config::load()?;
    config.validate()?;
    log_config(&config);

    let oracle = build_oracle(&config)?;
    let registry = VenueRegistry::from_config(&config.venues, oracle.clone())?;

    match cli.command {
        Some(Commands::Quote { symbol, spot }) => show_quote(oracle.as_ref(), &symbol, spot).await,
        Some(Commands::Position { symbol }) => show_positions(&registry, &symbol).await,
        Some(Commands::Run { method, trades }) => {
            let path = trades.unwrap_or_else(|| config.trades_path.clone());
            run_trade(config, oracle, registry, method, &path).await
        }
        None => {
            let path = config.trades_path.clone();
            run_trade(config, oracle, registry, Method::LongPrimary, &path).await
        }
    }
}

/// Build the gateway oracle with a file-backed or in-memory product id cache.
fn build_oracle(config: &Config) -> Result<Arc<dyn PriceOracle>> {
    let cache: Box<dyn ProductIdCache> = match &config.oracle.product_cache_path {
        Some(path) => Box::new(JsonFileCache::new(path)),
        None => Box::new(MemoryCache::new()),
    };
    let client = NadoGatewayClient::new(&config.oracle, cache)
        .context("Failed to create gateway oracle")?;
    Ok(Arc::new(client))
}

async fn run_trade(
    config: Config,
    oracle: Arc<dyn PriceOracle>,
    registry: VenueRegistry,
    method: Method,
    trades_path: &str,
) -> Result<()> {
    let specs = CsvTradeSource::from_path(trades_path).load()?;
    let Some(spec) = specs.into_iter().next() else {
        warn!(path = %trades_path, "No trade specifications found");
        return Ok(());
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    let executor = OrderExecutor::new(config.execution, oracle, registry, shutdown);
    let outcome = executor.run_method(method, &spec).await;

    match outcome.status() {
        TradeStatus::Complete => info!(
            symbol = %outcome.symbol,
            attempts = outcome.attempts,
            price = ?outcome.order_price.map(|p| p.to_decimal()),
            "Trade complete: primary filled, hedge submitted"
        ),
        TradeStatus::HedgeUnconfirmed => error!(
            symbol = %outcome.symbol,
            error = ?outcome.error,
            "Primary filled but hedge unconfirmed: position is unhedged"
        ),
        TradeStatus::NotFilled => warn!(
            symbol = %outcome.symbol,
            error = ?outcome.error,
            "Primary not filled, no hedge placed"
        ),
        TradeStatus::Aborted => warn!(symbol = %outcome.symbol, "Trade aborted"),
    }

    Ok(())
}

async fn show_quote(oracle: &dyn PriceOracle, symbol: &str, spot: bool) -> Result<()> {
    let product = if spot {
        ProductType::Spot
    } else {
        ProductType::Perp
    };
    let symbol = symbol.to_uppercase();

    match oracle.get_quote(&symbol, product).await {
        Some(quote) => println!(
            "{} {}: bid {} / ask {} / mid {}",
            symbol,
            product,
            fmt_side(quote.bid),
            fmt_side(quote.ask),
            fmt_side(quote.mid())
        ),
        None => println!("{} {}: no quote available", symbol, product),
    }
    Ok(())
}

fn fmt_side(side: Option<cross_venue_hedger::exchange::Cents>) -> String {
    side.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
}

async fn show_positions(registry: &VenueRegistry, symbol: &str) -> Result<()> {
    let symbol = symbol.to_uppercase();
    for id in registry.ids() {
        let surface = registry.surface(&id)?;
        match surface.read_position(&symbol).await {
            Ok(position) => println!("{:<16} {}", id, position),
            Err(e) => println!("{:<16} error: {}", id, e),
        }
    }
    Ok(())
}

/// Initialize logging to stdout and a daily rolling file.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", "cross-venue-hedger.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("cross_venue_hedger=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    Ok(())
}

fn log_config(config: &Config) {
    let exec = &config.execution;
    info!(
        check_interval_ms = exec.check_interval_ms,
        max_wait_ms = exec.max_wait_ms,
        retry_timeout_ms = exec.retry_timeout_ms,
        retry_pause_ms = exec.retry_pause_ms,
        long_primary_max_retries = exec.long_primary_max_retries,
        short_primary_max_retries = exec.short_primary_max_retries,
        "Execution configuration"
    );
    info!(
        base_url = %config.oracle.base_url,
        max_attempts = config.oracle.max_attempts,
        cache = ?config.oracle.product_cache_path,
        "Oracle configuration"
    );
    info!(venues = ?config.venues.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(), "Venues");
}
