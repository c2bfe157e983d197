use clap::{Args, Parser, Subcommand};
use sn_core::{Result, Stock, StockStorage, Storage};
use sn_scrapers::{
    init_logging, CrawlerConfig, FetcherConfig, LivemintFetcher, RecencyWindowCrawler,
};
use sn_web::{create_app, AppState, WebConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// Accepts `90`, `30s`, `2m`, `1h15m30s`, ...; a bare number means seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_number = false;

        let overflow = || "Duration is too large".to_string();

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = current_number.parse::<u64>().map_err(|_| overflow())?;
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(overflow)?;
                current_number.clear();
                has_number = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        if !current_number.is_empty() {
            let num = current_number.parse::<u64>().map_err(|_| overflow())?;
            total_seconds = total_seconds.checked_add(num).ok_or_else(overflow)?;
            has_number = true;
        }

        if !has_number {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Stock watchlists with recent company headlines", long_about = None)]
struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, env = "SN_STORAGE", default_value = "sqlite")]
    storage: String,
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "stocks.db")]
    database: PathBuf,
    #[command(flatten)]
    crawl: CrawlArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Upper bound on listing pages fetched per company
    #[arg(long, default_value_t = 100)]
    max_pages: u32,
    /// Headlines older than this many days stop the crawl
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=3650))]
    recency_days: u32,
    /// Per-request timeout (e.g. 15s, 1m)
    #[arg(long, default_value = "15s")]
    timeout: HumanDuration,
    /// Give up on a crawl after this long, keeping what was found
    #[arg(long)]
    deadline: Option<HumanDuration>,
    /// News site root
    #[arg(long, env = "NEWS_BASE_URL", default_value = LivemintFetcher::BASE_URL)]
    base_url: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
        /// Origin allowed to call the API with credentials (repeatable)
        #[arg(
            long = "allowed-origin",
            env = "ALLOWED_ORIGINS",
            value_delimiter = ',',
            default_value = "http://localhost:5173"
        )]
        allowed_origins: Vec<String>,
    },
    /// Print recent headlines mentioning a company
    News {
        company: String,
        /// Print JSON instead of a numbered list
        #[arg(long)]
        json: bool,
    },
    /// Add stocks to the catalog users can pick from
    AddStock {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List the stock catalog
    Stocks,
}

fn build_crawler(args: &CrawlArgs) -> Result<RecencyWindowCrawler> {
    let fetcher = LivemintFetcher::with_config(FetcherConfig {
        base_url: args.base_url.clone(),
        timeout: args.timeout.0,
        ..Default::default()
    })?;
    let config = CrawlerConfig {
        max_pages: args.max_pages,
        recency_window_days: args.recency_days,
        deadline: args.deadline.map(|d| d.0),
    };
    Ok(RecencyWindowCrawler::new(Arc::new(fetcher), config))
}

async fn open_storage(kind: &str, database: &Path) -> anyhow::Result<Arc<dyn Storage>> {
    let storage = sn_storage::create_storage(kind, Some(database)).await?;
    check_storage(&storage, kind).await?;
    Ok(storage)
}

async fn check_storage(storage: &Arc<dyn Storage>, storage_type: &str) -> Result<()> {
    match tokio::time::timeout(Duration::from_secs(10), storage.all_stocks()).await {
        Ok(result) => {
            let stocks = result?;
            info!("🏦 Storage backend ready (using {}, {} stocks)", storage_type, stocks.len());
            Ok(())
        }
        Err(e) => Err(sn_core::Error::Database(format!("Storage health check timed out: {}", e))),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn serve(
    storage: Arc<dyn Storage>,
    crawler: Arc<RecencyWindowCrawler>,
    port: u16,
    allowed_origins: Vec<String>,
) -> anyhow::Result<()> {
    let state = AppState::new(storage, crawler);
    let app = create_app(state, &WebConfig { allowed_origins });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Server running on port {}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn print_news(crawler: &RecencyWindowCrawler, company: &str, json: bool) -> anyhow::Result<()> {
    anyhow::ensure!(!company.trim().is_empty(), "Company name must not be empty");
    let outcome = crawler.crawl(company).await;
    if outcome.is_partial() {
        warn!(stop = ?outcome.stop, "Crawl ended early, results may be incomplete");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.headlines)?);
        return Ok(());
    }

    println!(
        "Headlines related to {} from the last {} days:",
        company,
        crawler.config().recency_window_days
    );
    for (index, headline) in outcome.headlines.iter().enumerate() {
        println!("{}. {}", index + 1, headline.text);
        println!("   Date: {}", headline.date);
        println!("   Link: {}", headline.link);
    }
    println!("Found a total of {} headlines", outcome.headlines.len());
    Ok(())
}

async fn add_stocks(storage: &dyn Storage, names: &[String]) -> anyhow::Result<Vec<Stock>> {
    let mut added = Vec::with_capacity(names.len());
    for name in names {
        anyhow::ensure!(!name.trim().is_empty(), "Stock name must not be empty");
        added.push(storage.add_stock(name.trim()).await?);
    }
    Ok(added)
}

fn print_stocks(stocks: &[Stock]) {
    for stock in stocks {
        println!("{}\t{}", stock.id, stock.stock);
    }
}

/// Runs one command. Storage is opened only by the commands that read or write it.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        storage: kind,
        database,
        crawl,
        command,
    } = cli;

    match command {
        Commands::News { company, json } => {
            let crawler = build_crawler(&crawl)?;
            print_news(&crawler, &company, json).await
        }
        Commands::Serve { port, allowed_origins } => {
            let crawler = Arc::new(build_crawler(&crawl)?);
            let storage = open_storage(&kind, &database).await?;
            let result = serve(storage.clone(), crawler, port, allowed_origins).await;
            storage.close().await;
            result
        }
        Commands::AddStock { names } => {
            let storage = open_storage(&kind, &database).await?;
            let result = add_stocks(storage.as_ref(), &names).await;
            storage.close().await;
            print_stocks(&result?);
            Ok(())
        }
        Commands::Stocks => {
            let storage = open_storage(&kind, &database).await?;
            let result = storage.all_stocks().await;
            storage.close().await;
            print_stocks(&result?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    run(Cli::parse()).await
}
