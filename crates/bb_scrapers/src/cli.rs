use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bb_core::{ArticleStorage, Result};
use bb_inference::Classifier;
use clap::Args;

use crate::fetcher::{FetchConfig, HttpFetcher, RENDER_TOKEN_ENV, RENDER_URL_ENV};
use crate::harvester::{HarvestConfig, HarvestReport, Harvester};
use crate::locator::{ArticleLocator, DiscoveryLimits};
use crate::selectors::{CompiledCatalog, SelectorCatalog};

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,
    /// Shortest politeness delay between requests, in seconds
    #[arg(long, default_value_t = 1.5)]
    pub min_delay: f64,
    /// Longest politeness delay between requests, in seconds
    #[arg(long, default_value_t = 4.0)]
    pub max_delay: f64,
    /// Attempts per fetch strategy on transient failures
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,
    /// Skip the second user-agent attempt
    #[arg(long)]
    pub no_alternate_agent: bool,
    /// Headless rendering service used as the last fetch strategy
    #[arg(long, env = RENDER_URL_ENV)]
    pub render_url: Option<String>,
    #[arg(long, env = RENDER_TOKEN_ENV, hide_env_values = true)]
    pub render_token: Option<String>,
}

impl FetchArgs {
    pub fn to_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        let min_delay = Duration::from_secs_f64(self.min_delay.max(0.0));
        FetchConfig {
            timeout: Duration::from_secs(self.timeout),
            max_attempts: self.attempts.max(1),
            delay_min: min_delay,
            delay_max: Duration::from_secs_f64(self.max_delay.max(0.0)).max(min_delay),
            alternate_user_agent: if self.no_alternate_agent {
                None
            } else {
                defaults.alternate_user_agent.clone()
            },
            render_url: self.render_url.clone(),
            render_token: self.render_token.clone(),
            ..defaults
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// Seed URL of the blog listing
    pub url: String,
    #[arg(long, default_value_t = 20)]
    pub max_pages: usize,
    #[arg(long, default_value_t = 1000)]
    pub max_urls: usize,
    /// JSON file overriding the built-in selector lists
    #[arg(long)]
    pub selectors: Option<PathBuf>,
    #[command(flatten)]
    pub fetch: FetchArgs,
}

impl DiscoverArgs {
    pub fn limits(&self) -> DiscoveryLimits {
        DiscoveryLimits {
            max_pages: self.max_pages,
            max_urls: self.max_urls,
        }
    }

    pub fn catalog(&self) -> Result<Arc<CompiledCatalog>> {
        let catalog = match &self.selectors {
            Some(path) => SelectorCatalog::from_json_file(path)?,
            None => SelectorCatalog::default(),
        };
        Ok(Arc::new(catalog.compile()?))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    #[command(flatten)]
    pub discover: DiscoverArgs,
    /// Upper bound on articles processed per run
    #[arg(long, default_value_t = 50)]
    pub max_articles: usize,
}

impl ScrapeArgs {
    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig {
            max_articles: self.max_articles,
            limits: self.discover.limits(),
            ..HarvestConfig::default()
        }
    }
}

pub async fn run_discover(args: &DiscoverArgs) -> Result<BTreeSet<String>> {
    let fetcher = Arc::new(HttpFetcher::new(args.fetch.to_config())?);
    let locator = ArticleLocator::new(fetcher, args.catalog()?, args.limits());
    locator.discover(&args.url).await
}

/// Harvests into `storage`. Ctrl-C stops the run between articles.
pub async fn run_scrape(
    args: &ScrapeArgs,
    storage: Arc<dyn ArticleStorage>,
    classifier: Arc<Classifier>,
) -> Result<HarvestReport> {
    let fetcher = Arc::new(HttpFetcher::new(args.discover.fetch.to_config())?);
    let harvester = Harvester::new(
        fetcher,
        args.discover.catalog()?,
        classifier,
        storage,
        args.harvest_config(),
    );

    let cancel = harvester.cancel_handle();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, finishing current article");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let result = harvester.harvest(&args.discover.url).await;
    watcher.abort();
    result
}
