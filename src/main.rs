//! CARDLINE: trade-up combination scanner for collectible skins.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the catalog view and candidate pool, preloads market prices,
//! runs the combination search, and persists the ranked report.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use cardline::catalog::pool::CandidatePool;
use cardline::catalog::{self, CatalogView};
use cardline::config::AppConfig;
use cardline::market;
use cardline::market::buff::BuffClient;
use cardline::report::{self, SearchReport};
use cardline::search::{self, SearchOutcome};

const BANNER: &str = r#"
  ____    _    ____  ____  _     ___ _   _ _____
 / ___|  / \  |  _ \|  _ \| |   |_ _| \ | | ____|
| |     / _ \ | |_) | | | | |    | ||  \| |  _|
| |___ / ___ \|  _ <| |_| | |___ | || |\  | |___
 \____/_/   \_\_| \_\____/|_____|___|_| \_|_____|

  Trade-up combination scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        catalog = %cfg.catalog.path,
        target_tier = %cfg.search.target_tier,
        strategy = %cfg.search.strategy,
        "CARDLINE starting up"
    );

    // -- Catalog and candidate pool ---------------------------------------

    let records = catalog::load_catalog(&cfg.catalog.path)?;
    let view = CatalogView::build(records, &cfg.catalog.options())?;
    let mut pool = CandidatePool::build(&view);
    info!(items = pool.items.len(), "Candidate pool ready");

    // -- Market prices -----------------------------------------------------

    let client = BuffClient::new(cfg.market.buff_config(), cfg.market.session_cookie())?;
    let cache =
        market::preload_prices(&client, &view, &pool, cfg.market.fetch_concurrency).await?;
    pool.attach_prices(&cache);

    // -- Search ------------------------------------------------------------

    let request = cfg.search_request()?;
    let outcome = search::run_search(Arc::new(view), Arc::new(cache), &pool, &request).await?;
    let SearchOutcome {
        candidates,
        summary,
    } = outcome;

    // -- Report ------------------------------------------------------------

    let search_report = SearchReport::new(
        request.target_tier,
        request.tolerance,
        &request.strategy.to_string(),
        summary,
        &candidates,
    );
    report::print_report(&search_report);
    let path = report::save_report(&search_report, &cfg.report.output_dir)?;
    info!(path = %path.display(), "CARDLINE done.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cardline=info"));

    let json_logging = std::env::var("CARDLINE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
