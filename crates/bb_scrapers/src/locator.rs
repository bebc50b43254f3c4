use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use bb_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::fetcher::PageSource;
use crate::selectors::{first_match, CompiledCatalog};

#[derive(Debug, Clone)]
pub struct DiscoveryLimits {
    pub max_pages: usize,
    pub max_urls: usize,
}

impl Default for DiscoveryLimits {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_urls: 1000,
        }
    }
}

/// What one listing page contributed.
#[derive(Debug, Default, PartialEq)]
pub struct PageScan {
    pub links: Vec<String>,
    pub next: Option<String>,
}

/// Walks a paginated listing from a seed URL and collects article URLs.
pub struct ArticleLocator {
    source: Arc<dyn PageSource>,
    catalog: Arc<CompiledCatalog>,
    limits: DiscoveryLimits,
}

impl ArticleLocator {
    pub fn new(source: Arc<dyn PageSource>, catalog: Arc<CompiledCatalog>, limits: DiscoveryLimits) -> Self {
        Self { source, catalog, limits }
    }

    /// De-duplicated article URLs, sorted. Fails only when the seed page
    /// itself cannot be fetched; later pages just end the walk.
    pub async fn discover(&self, seed_url: &str) -> Result<BTreeSet<String>> {
        Url::parse(seed_url)?;

        let mut found = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut next = Some(seed_url.to_string());
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            if pages >= self.limits.max_pages {
                tracing::info!("📄 Page limit ({}) reached", self.limits.max_pages);
                break;
            }
            if !visited.insert(page_url.clone()) {
                tracing::debug!("Pagination loops back to {}", page_url);
                break;
            }

            let page = match self.source.fetch(&page_url).await {
                Some(page) => page,
                None if pages == 0 => {
                    return Err(Error::Discovery(format!("seed page unreachable: {}", seed_url)));
                }
                None => {
                    tracing::warn!("⚠️ Stopping pagination, could not fetch {}", page_url);
                    break;
                }
            };
            pages += 1;

            let scan = scan_page(&page.html, &page.url, &self.catalog);
            tracing::info!("🔍 Page {}: {} article links", pages, scan.links.len());
            for link in scan.links {
                if found.len() >= self.limits.max_urls {
                    break;
                }
                found.insert(link);
            }
            if found.len() >= self.limits.max_urls {
                tracing::info!("🔗 URL limit ({}) reached", self.limits.max_urls);
                break;
            }
            next = scan.next;
        }

        tracing::info!("🔍 Discovered {} article URLs over {} pages", found.len(), pages);
        Ok(found)
    }
}

/// Article links and the next-page target of one listing page.
pub fn scan_page(html: &str, page_url: &Url, catalog: &CompiledCatalog) -> PageScan {
    let document = Html::parse_document(html);
    let base = base_url(&document, page_url);

    let mut links = container_links(&document, &base, catalog);
    if links.is_empty() {
        links = whole_page_links(&document, &base, catalog);
    }

    let mut seen = HashSet::new();
    links.retain(|l| seen.insert(l.clone()));

    PageScan {
        links,
        next: next_page(&document, &base, catalog),
    }
}

/// Page URL, or the document's `<base href>` resolved against it.
fn base_url(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|s| {
            document
                .select(&s)
                .next()
                .and_then(|el| el.value().attr("href"))
                .and_then(|href| page_url.join(href).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves an href to an absolute http(s) URL without its fragment.
fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

fn href_of(el: &ElementRef, base: &Url) -> Option<String> {
    el.value().attr("href").and_then(|href| resolve(base, href))
}

fn container_links(document: &Html, base: &Url, catalog: &CompiledCatalog) -> Vec<String> {
    let containers: Vec<ElementRef> = first_match(&catalog.articles, |selector| {
        let matched: Vec<ElementRef> = document.select(selector).collect();
        (!matched.is_empty()).then_some(matched)
    })
    .unwrap_or_default();

    let any_link = Selector::parse("a[href]").ok();
    containers
        .iter()
        .filter_map(|container| {
            first_match(&catalog.article_link, |selector| {
                container.select(selector).find_map(|a| href_of(&a, base))
            })
            .or_else(|| {
                // No catalogued link inside: the first plain link will do.
                let any_link = any_link.as_ref()?;
                container.select(any_link).find_map(|a| href_of(&a, base))
            })
        })
        .collect()
}

fn whole_page_links(document: &Html, base: &Url, catalog: &CompiledCatalog) -> Vec<String> {
    catalog
        .article_link
        .iter()
        .flat_map(|selector| document.select(selector).filter_map(|a| href_of(&a, base)).collect::<Vec<_>>())
        .collect()
}

fn next_page(document: &Html, base: &Url, catalog: &CompiledCatalog) -> Option<String> {
    first_match(&catalog.next_page, |selector| {
        document.select(selector).find_map(|el| href_of(&el, base))
    })
    .or_else(|| {
        let anchors = Selector::parse("a[href]").ok()?;
        document.select(&anchors).find_map(|a| {
            let text = a.text().collect::<String>().trim().to_lowercase();
            if catalog.next_page_texts.iter().any(|t| *t == text) {
                href_of(&a, base)
            } else {
                None
            }
        })
    })
}
