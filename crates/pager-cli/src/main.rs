//! Pager CLI - browse a simulated practice-session backend through the cache.
//!
//! Runs a comma-separated navigation script (`1,next,next,prev,reload`)
//! against a `PaginatedCache` and prints each published page.

mod commands;
mod sessions;

use anyhow::Result;
use clap::Parser;
use commands::{parse_script, Browser};
use pager_core::config::StoreConfig;
use pager_core::{
    CacheSettings, MemoryPageStore, PageStore, PagerConfig, PaginatedCache, SqlitePageStore,
};
use sessions::{SessionBackend, SessionFilter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pager-cli")]
#[command(about = "Browse paginated practice sessions through a page cache")]
struct Args {
    /// Navigation script, e.g. "1,next,next,prev,filter:piano,reload"
    #[arg(short, long, default_value = "1,next,next,prev,goto:1")]
    script: String,

    /// Items per page
    #[arg(long, default_value_t = PagerConfig::DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Number of sessions the simulated backend holds
    #[arg(long, default_value = "57")]
    sessions: u64,

    /// Simulated backend latency in milliseconds
    #[arg(long, default_value = "25")]
    latency_ms: u64,

    /// Page lifetime in milliseconds (unbounded when omitted)
    #[arg(long)]
    ttl_ms: Option<u64>,

    /// Initial instrument filter
    #[arg(long)]
    instrument: Option<String>,

    /// Directory for a persistent SQLite page store (in-memory when omitted)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let script = parse_script(&args.script)?;
    info!("Starting pager CLI with {} commands", script.len());

    let store: Arc<dyn PageStore> = match &args.store_dir {
        Some(dir) => {
            let path = dir.join(StoreConfig::SQLITE_FILE_NAME);
            info!("Using page store at {}", path.display());
            Arc::new(SqlitePageStore::open(&path)?)
        }
        None => Arc::new(MemoryPageStore::new()),
    };

    let mut settings = CacheSettings::new("practice-sessions");
    if let Some(ttl) = args.ttl_ms {
        settings = settings.with_max_page_lifetime(Duration::from_millis(ttl));
    }

    let backend = Arc::new(SessionBackend::generate(
        args.sessions,
        Duration::from_millis(args.latency_ms),
    ));
    let cache = PaginatedCache::builder(settings.cache_key.clone(), backend.clone())
        .settings(&settings)
        .store(store)
        .build();

    let mut loading = cache.subscribe_loading();
    let watcher = tokio::spawn(async move {
        while loading.changed().await.is_ok() {
            debug!("Loading: {}", *loading.borrow_and_update());
        }
    });

    let mut browser = Browser::new(
        &cache,
        args.page_size,
        args.instrument.clone().map(SessionFilter::instrument),
    );

    for command in &script {
        let outcome = browser.run(command).await?;
        let Some(outcome) = outcome else {
            println!("{:?}", command);
            continue;
        };

        let page = cache.data();
        // Intentional stdout: this is the tool's output
        println!(
            "{:?} -> {:?}: page {}/{} ({} of {} sessions)",
            command,
            outcome,
            page.current_page,
            page.total_pages,
            page.items.len(),
            page.total_items
        );
        for session in &page.items {
            println!(
                "  #{:<4} {:<7} {:>3} min  {}",
                session.id,
                session.instrument,
                session.minutes,
                session.started_at.format("%Y-%m-%d %H:%M")
            );
        }
        if let Some(err) = cache.error() {
            println!("  error: {}", err);
        }
    }

    info!(
        "Done: {} backend requests, {} cached pages",
        backend.request_count(),
        cache.cached_page_count()?
    );

    watcher.abort();
    Ok(())
}
