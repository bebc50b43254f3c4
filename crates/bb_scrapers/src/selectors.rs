//! Ordered selector lists per semantic field. Order is priority: the first
//! selector that yields something wins.

use std::path::Path;

use bb_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

const ARTICLES: &[&str] = &[
    "article",
    ".post", ".entry", ".blog-post",
    ".post-item", ".post-list-item",
    "[itemprop=\"blogPost\"]",
    ".story", ".card", ".content-item",
    "div.post", "div.article", "div.entry-content",
    "li.post", "li.entry",
    "section.content", "div.main-content",
    "div[class*=\"post\"]", "div[class*=\"entry\"]",
];

const ARTICLE_LINK: &[&str] = &[
    "a.entry-title-link", "a.post-title",
    "h2 > a", "h3 > a",
    "a.more-link", "a.read-more",
    "a[rel=\"bookmark\"]",
    "a.article-link", "a.story-link",
    "a[itemprop=\"url\"]",
    "a.title-link", "a.headline-link",
    "div.post-header > a",
    "a[href*=\"/blog/\"]", "a[href*=\"/post/\"]",
];

const TITLE: &[&str] = &[
    "h1", "h1.entry-title", "h1.post-title",
    "h1[itemprop=\"headline\"]",
    "header h1", "div.post-header h1",
    "title",
    ".post-title", ".entry-title", ".headline",
    "h1.title", "h1.blog-title",
];

const CONTENT: &[&str] = &[
    "div.entry-content", "div.post-content",
    "div.article-body", "div.content-area",
    "[itemprop=\"articleBody\"]",
    "div.main-content", "section.content",
    "article > div",
    "div.content", "div.body-content",
    "div.post-body", "div.entry-text",
    "div.rich-text", "div#content",
];

const DATE: &[&str] = &[
    "time.entry-date", "span.post-date",
    "time[datetime]",
    "time.published", "time.updated",
    "div.date", "span.date",
    "meta[itemprop=\"datePublished\"]",
    "div.timestamp", "small.date",
    "div.post-meta > time",
];

const NEXT_PAGE: &[&str] = &[
    "a.next", "li.next > a",
    "a.pagination-next",
    "link[rel=\"next\"]",
    "a[aria-label=\"Next\"]",
    "button.load-more",
];

/// Anchor texts that mark a next-page link when no class gives it away.
const NEXT_PAGE_TEXTS: &[&str] = &["Siguiente", "Next", "»"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Selector lists as configured. Fields missing from a JSON override keep
/// their built-in lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorCatalog {
    pub articles: Vec<String>,
    pub article_link: Vec<String>,
    pub title: Vec<String>,
    pub content: Vec<String>,
    pub date: Vec<String>,
    pub next_page: Vec<String>,
    pub next_page_texts: Vec<String>,
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self {
            articles: owned(ARTICLES),
            article_link: owned(ARTICLE_LINK),
            title: owned(TITLE),
            content: owned(CONTENT),
            date: owned(DATE),
            next_page: owned(NEXT_PAGE),
            next_page_texts: owned(NEXT_PAGE_TEXTS),
        }
    }
}

impl SelectorCatalog {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let catalog: SelectorCatalog = serde_json::from_str(&raw)?;
        tracing::info!("📋 Loaded selector catalog from {}", path.display());
        Ok(catalog)
    }

    /// Parses every pattern once. Patterns the CSS parser rejects are
    /// dropped with a warning; an article field left empty is an error.
    pub fn compile(&self) -> Result<CompiledCatalog> {
        let catalog = CompiledCatalog {
            articles: compile_list("articles", &self.articles),
            article_link: compile_list("article_link", &self.article_link),
            title: compile_list("title", &self.title),
            content: compile_list("content", &self.content),
            date: compile_list("date", &self.date),
            next_page: compile_list("next_page", &self.next_page),
            next_page_texts: self
                .next_page_texts
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        };
        if catalog.articles.is_empty() && catalog.article_link.is_empty() {
            return Err(Error::Validation(
                "selector catalog has no usable article or link selectors".to_string(),
            ));
        }
        Ok(catalog)
    }
}

fn compile_list(field: &str, patterns: &[String]) -> Vec<Selector> {
    patterns
        .iter()
        .filter_map(|pattern| match Selector::parse(pattern) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::warn!("⚠️ Skipping invalid {} selector {:?}: {:?}", field, pattern, e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CompiledCatalog {
    pub articles: Vec<Selector>,
    pub article_link: Vec<Selector>,
    pub title: Vec<Selector>,
    pub content: Vec<Selector>,
    pub date: Vec<Selector>,
    pub next_page: Vec<Selector>,
    /// Lowercased.
    pub next_page_texts: Vec<String>,
}

/// Runs `probe` over the selectors in order and stops at the first one that
/// yields a value.
pub fn first_match<T>(selectors: &[Selector], probe: impl FnMut(&Selector) -> Option<T>) -> Option<T> {
    selectors.iter().find_map(probe)
}

/// First element of the first selector that matches anything in `document`
/// and whose text passes `accept`.
pub fn first_element<'a>(
    document: &'a Html,
    selectors: &[Selector],
    mut accept: impl FnMut(&ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    first_match(selectors, |selector| document.select(selector).find(|el| accept(el)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn selectors(patterns: &[&str]) -> Vec<Selector> {
        patterns.iter().map(|p| Selector::parse(p).unwrap()).collect()
    }

    fn text_of(el: &ElementRef) -> String {
        el.text().collect::<String>().trim().to_string()
    }

    #[test]
    fn test_priority_order() {
        let list = selectors(&["h1.first", "h1.second", "h1.third"]);

        let only_third = Html::parse_document("<h1 class='third'>tercero</h1>");
        let found = first_element(&only_third, &list, |el| !text_of(el).is_empty()).unwrap();
        assert_eq!(text_of(&found), "tercero");

        let first_and_third = Html::parse_document(
            "<h1 class='third'>tercero</h1><h1 class='first'>primero</h1>",
        );
        let found = first_element(&first_and_third, &list, |el| !text_of(el).is_empty()).unwrap();
        assert_eq!(text_of(&found), "primero");
    }

    #[test]
    fn test_empty_matches_fall_through() {
        let list = selectors(&["h1", "h2"]);
        let doc = Html::parse_document("<h1>  </h1><h2>Subtítulo</h2>");
        let found = first_element(&doc, &list, |el| !text_of(el).is_empty()).unwrap();
        assert_eq!(text_of(&found), "Subtítulo");
        assert!(first_element(&Html::parse_document("<p>x</p>"), &list, |_| true).is_none());
    }

    #[test]
    fn test_default_catalog_compiles() {
        let compiled = SelectorCatalog::default().compile().unwrap();
        assert_eq!(compiled.articles.len(), ARTICLES.len());
        assert_eq!(compiled.next_page.len(), NEXT_PAGE.len());
        assert_eq!(compiled.next_page_texts, vec!["siguiente", "next", "»"]);
    }

    #[test]
    fn test_invalid_patterns_are_dropped() {
        let catalog = SelectorCatalog {
            title: vec!["h1".to_string(), "a:contains(\"x\")".to_string(), "[[".to_string()],
            ..SelectorCatalog::default()
        };
        assert_eq!(catalog.compile().unwrap().title.len(), 1);

        let empty = SelectorCatalog {
            articles: vec![],
            article_link: vec!["[[".to_string()],
            ..SelectorCatalog::default()
        };
        assert!(empty.compile().is_err());
    }

    #[test]
    fn test_partial_json_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": [".headline"], "next_page_texts": ["Más"]}}"#).unwrap();

        let catalog = SelectorCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.title, vec![".headline"]);
        assert_eq!(catalog.next_page_texts, vec!["Más"]);
        assert_eq!(catalog.content, SelectorCatalog::default().content);
    }
}
