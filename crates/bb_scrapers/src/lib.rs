pub mod cli;
pub mod extractor;
pub mod fetcher;
pub mod harvester;
pub mod jsonld;
pub mod locator;
pub mod logging;
pub mod selectors;

pub use cli::{run_discover, run_scrape, DiscoverArgs, FetchArgs, ScrapeArgs};
pub use extractor::ArticleExtractor;
pub use fetcher::{FetchConfig, HttpFetcher, Page, PageSource};
pub use harvester::{HarvestConfig, HarvestReport, Harvester};
pub use locator::{ArticleLocator, DiscoveryLimits};
pub use logging::{init_logging, Logger};
pub use selectors::{CompiledCatalog, SelectorCatalog};

pub mod prelude {
    pub use super::fetcher::PageSource;
    pub use super::harvester::{HarvestReport, Harvester};
    pub use bb_core::{ArticleDraft, Error, Result};
}
