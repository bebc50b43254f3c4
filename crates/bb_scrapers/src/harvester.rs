use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bb_core::{ArticleStorage, Error, Result};
use bb_inference::Classifier;
use url::Url;

use crate::extractor::ArticleExtractor;
use crate::fetcher::PageSource;
use crate::locator::{ArticleLocator, DiscoveryLimits};
use crate::logging::Logger;
use crate::selectors::CompiledCatalog;

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub max_articles: usize,
    pub limits: DiscoveryLimits,
    /// Progress is logged every this many URLs.
    pub progress_every: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_articles: 50,
            limits: DiscoveryLimits::default(),
            progress_every: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub discovered: usize,
    pub attempted: usize,
    pub saved: usize,
    pub already_present: usize,
    pub failed: usize,
    pub interrupted: bool,
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} processed: {} saved, {} already stored, {} failed{}",
            self.discovered,
            self.attempted,
            self.saved,
            self.already_present,
            self.failed,
            if self.interrupted { " (interrupted)" } else { "" }
        )
    }
}

/// Discovers article URLs from a seed and runs each one through
/// extraction, classification and storage, strictly one at a time.
pub struct Harvester {
    locator: ArticleLocator,
    extractor: ArticleExtractor,
    storage: Arc<dyn ArticleStorage>,
    config: HarvestConfig,
    cancel: Arc<AtomicBool>,
}

impl Harvester {
    pub fn new(
        source: Arc<dyn PageSource>,
        catalog: Arc<CompiledCatalog>,
        classifier: Arc<Classifier>,
        storage: Arc<dyn ArticleStorage>,
        config: HarvestConfig,
    ) -> Self {
        Self {
            locator: ArticleLocator::new(Arc::clone(&source), Arc::clone(&catalog), config.limits.clone()),
            extractor: ArticleExtractor::new(source, catalog, classifier),
            storage,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between URLs. Setting it stops the run after the
    /// current article; everything saved so far stays saved.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub async fn discover(&self, seed_url: &str) -> Result<BTreeSet<String>> {
        let urls = self.locator.discover(seed_url).await?;
        if urls.is_empty() {
            return Err(Error::Discovery(format!("no article links found from {}", seed_url)));
        }
        Ok(urls)
    }

    pub async fn harvest(&self, seed_url: &str) -> Result<HarvestReport> {
        let logger = Logger::new().with_prefix("🌐").with_prefix(host_of(seed_url));
        let urls = self.discover(seed_url).await?;

        let mut report = HarvestReport {
            discovered: urls.len(),
            ..HarvestReport::default()
        };
        let total = urls.len().min(self.config.max_articles);
        logger.info(&format!("🔍 {} articles discovered, processing {}", urls.len(), total));

        for (idx, url) in urls.iter().take(total).enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                logger.warn("🛑 Harvest interrupted");
                report.interrupted = true;
                break;
            }
            report.attempted += 1;
            self.process(url, &mut report, &logger).await;

            let done = idx + 1;
            if self.config.progress_every > 0 && done % self.config.progress_every == 0 {
                logger.info(&format!("📊 Progress: {}/{}", done, total));
            }
        }

        logger.info(&format!("✅ Harvest finished: {}", report));
        Ok(report)
    }

    async fn process(&self, url: &str, report: &mut HarvestReport, logger: &Logger) {
        match self.storage.exists(url).await {
            Ok(true) => {
                logger.debug(&format!("⏭️ Already stored: {}", url));
                report.already_present += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                logger.error(&format!("❌ Could not check {}: {}", url, e));
                report.failed += 1;
                return;
            }
        }

        let Some(draft) = self.extractor.extract(url).await else {
            logger.warn(&format!("⚠️ Skipping unreachable article {}", url));
            report.failed += 1;
            return;
        };

        if self.storage.save(&draft).await {
            logger.info(&format!("🆕 [{} / {}] {}", draft.category, draft.level, draft.title));
            report.saved += 1;
        } else {
            report.failed += 1;
        }
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Page;
    use crate::selectors::SelectorCatalog;
    use async_trait::async_trait;
    use bb_core::Category;
    use bb_inference::LexicalAnalyzer;
    use bb_storage::{MemoryStorage, StorageConfig};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct Site {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageSource for Site {
        async fn fetch(&self, url: &str) -> Option<Page> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages.get(url).map(|html| Page {
                url: Url::parse(url).unwrap(),
                html: html.clone(),
            })
        }
    }

    const SEED: &str = "https://huerta.example.com/";

    fn site(extra: &[(&str, &str)]) -> Arc<Site> {
        let mut pages: HashMap<String, String> = HashMap::new();
        pages.insert(
            SEED.to_string(),
            r#"<article><h2><a href="/blog/riego">Riego</a></h2></article>
               <article><h2><a href="/blog/compost">Compost</a></h2></article>"#
                .to_string(),
        );
        pages.insert(
            "https://huerta.example.com/blog/riego".to_string(),
            r#"<h1>Riego</h1><div class="entry-content">Riega la planta. Corta las hojas.
               Abona el suelo. Observa resultados.</div>"#
                .to_string(),
        );
        pages.insert(
            "https://huerta.example.com/blog/compost".to_string(),
            r#"<h1>Compost</h1><div class="entry-content">Un caso real de compost comunitario.</div>"#
                .to_string(),
        );
        for (url, html) in extra {
            pages.insert(url.to_string(), html.to_string());
        }
        Arc::new(Site {
            pages,
            fetched: Mutex::new(Vec::new()),
        })
    }

    async fn harvester(site: Arc<Site>, storage: Arc<dyn ArticleStorage>, config: HarvestConfig) -> Harvester {
        Harvester::new(
            site,
            Arc::new(SelectorCatalog::default().compile().unwrap()),
            Arc::new(Classifier::new(Arc::new(LexicalAnalyzer::new()))),
            storage,
            config,
        )
    }

    async fn memory() -> Arc<dyn ArticleStorage> {
        Arc::new(MemoryStorage::new(&StorageConfig::default()).await.unwrap())
    }

    #[tokio::test]
    async fn test_harvest_and_rerun() {
        let storage = memory().await;
        let h = harvester(site(&[]), Arc::clone(&storage), HarvestConfig::default()).await;

        let report = h.harvest(SEED).await.unwrap();
        assert_eq!(report.discovered, 2);
        assert_eq!(report.saved, 2);
        assert_eq!(storage.count().await.unwrap(), 2);

        let articles = storage.all().await.unwrap();
        let riego = articles.iter().find(|a| a.title == "Riego").unwrap();
        assert_eq!(riego.category, Category::Practice);
        let compost = articles.iter().find(|a| a.title == "Compost").unwrap();
        assert_eq!(compost.category, Category::CaseStudy);

        let again = h.harvest(SEED).await.unwrap();
        assert_eq!(again.saved, 0);
        assert_eq!(again.already_present, 2);
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stored_urls_are_not_fetched() {
        let site = site(&[]);
        let storage = memory().await;
        let h = harvester(Arc::clone(&site), Arc::clone(&storage), HarvestConfig::default()).await;
        h.harvest(SEED).await.unwrap();
        site.fetched.lock().unwrap().clear();

        h.harvest(SEED).await.unwrap();
        assert_eq!(*site.fetched.lock().unwrap(), vec![SEED.to_string()]);
    }

    #[tokio::test]
    async fn test_max_articles_cap() {
        let storage = memory().await;
        let config = HarvestConfig {
            max_articles: 1,
            ..HarvestConfig::default()
        };
        let report = harvester(site(&[]), Arc::clone(&storage), config).await.harvest(SEED).await.unwrap();
        assert_eq!(report.discovered, 2);
        assert_eq!(report.attempted, 1);
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_article_is_counted() {
        let seed = "https://roto.example.com/";
        let site = Arc::new(Site {
            pages: [(
                seed.to_string(),
                r#"<article><h2><a href="/blog/perdido">x</a></h2></article>"#.to_string(),
            )]
            .into_iter()
            .collect(),
            fetched: Mutex::new(Vec::new()),
        });
        let report = harvester(site, memory().await, HarvestConfig::default())
            .await
            .harvest(seed)
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.saved, 0);
    }

    #[tokio::test]
    async fn test_discovery_failures() {
        let h = harvester(site(&[]), memory().await, HarvestConfig::default()).await;
        assert!(matches!(h.harvest("https://otro.example.com/").await, Err(Error::Discovery(_))));

        let empty = "https://vacio.example.com/";
        let h = harvester(site(&[(empty, "<p>sin artículos</p>")]), memory().await, HarvestConfig::default()).await;
        assert!(matches!(h.harvest(empty).await, Err(Error::Discovery(_))));
    }

    #[tokio::test]
    async fn test_cancellation_between_urls() {
        let storage = memory().await;
        let h = harvester(site(&[]), Arc::clone(&storage), HarvestConfig::default()).await;
        h.cancel_handle().store(true, Ordering::SeqCst);

        let report = h.harvest(SEED).await.unwrap();
        assert!(report.interrupted);
        assert_eq!(report.attempted, 0);
        assert_eq!(storage.count().await.unwrap(), 0);
    }
}
