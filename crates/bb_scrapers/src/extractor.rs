use std::sync::Arc;

use bb_core::types::{truncate_chars, MISSING_CONTENT_PLACEHOLDER, TITLE_MAX_CHARS, UNTITLED_PLACEHOLDER};
use bb_core::ArticleDraft;
use bb_inference::Classifier;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Node};

use crate::fetcher::PageSource;
use crate::jsonld;
use crate::selectors::{first_element, first_match, CompiledCatalog};

/// Subtrees never counted as article text.
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "aside", "header", "iframe"];

/// Raw fields of an article page. Empty strings mean nothing matched.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedArticle {
    pub title: String,
    pub content: String,
    pub date: Option<NaiveDate>,
}

/// Fetches article pages and turns them into classified drafts.
pub struct ArticleExtractor {
    source: Arc<dyn PageSource>,
    catalog: Arc<CompiledCatalog>,
    classifier: Arc<Classifier>,
}

impl ArticleExtractor {
    pub fn new(source: Arc<dyn PageSource>, catalog: Arc<CompiledCatalog>, classifier: Arc<Classifier>) -> Self {
        Self {
            source,
            catalog,
            classifier,
        }
    }

    /// `None` only when the page cannot be fetched. Missing title or body
    /// degrade to placeholders.
    pub async fn extract(&self, url: &str) -> Option<ArticleDraft> {
        let page = self.source.fetch(url).await?;
        let parsed = parse_article(&page.html, &self.catalog);

        let (category, level) = self.classifier.classify(&parsed.content);
        let title = if parsed.title.is_empty() {
            tracing::warn!("⚠️ No title found for {}", url);
            UNTITLED_PLACEHOLDER.to_string()
        } else {
            truncate_chars(&parsed.title, TITLE_MAX_CHARS)
        };
        let content = if parsed.content.is_empty() {
            tracing::warn!("⚠️ No content found for {}", url);
            MISSING_CONTENT_PLACEHOLDER.to_string()
        } else {
            parsed.content
        };

        Some(ArticleDraft {
            title,
            content,
            url: url.to_string(),
            date: parsed.date,
            category,
            level,
        })
    }
}

pub fn parse_article(html: &str, catalog: &CompiledCatalog) -> ParsedArticle {
    let document = Html::parse_document(html);

    let title = first_text(&document, &catalog.title)
        .or_else(|| jsonld::headline(&document))
        .unwrap_or_default();
    let content = first_text(&document, &catalog.content).unwrap_or_default();
    let date = first_match(&catalog.date, |selector| {
        document.select(selector).find_map(|el| element_date(&el))
    })
    .or_else(|| jsonld::published_date(&document));

    ParsedArticle { title, content, date }
}

fn first_text(document: &Html, selectors: &[scraper::Selector]) -> Option<String> {
    first_element(document, selectors, |el| !clean_text(el).is_empty()).map(|el| clean_text(&el))
}

/// Date from `datetime` or `content`, falling back to the element text.
fn element_date(el: &ElementRef) -> Option<NaiveDate> {
    ["datetime", "content"]
        .iter()
        .filter_map(|attr| el.value().attr(attr))
        .find_map(parse_date)
        .or_else(|| parse_date(&el.text().collect::<String>()))
}

/// Calendar date from an ISO timestamp (cut to `YYYY-MM-DD`) or a common
/// day-first format.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Whitespace-joined text of an element, skipping boilerplate subtrees.
pub fn clean_text(element: &ElementRef) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join(" ")
}

fn collect_text(element: &ElementRef, parts: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            Node::Element(el) if STRIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(&child, parts);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Page;
    use crate::selectors::SelectorCatalog;
    use async_trait::async_trait;
    use bb_core::{Category, Level};
    use bb_inference::LexicalAnalyzer;
    use url::Url;

    fn catalog() -> CompiledCatalog {
        SelectorCatalog::default().compile().unwrap()
    }

    struct OnePage(Option<String>);

    #[async_trait]
    impl PageSource for OnePage {
        async fn fetch(&self, url: &str) -> Option<Page> {
            self.0.clone().map(|html| Page {
                url: Url::parse(url).unwrap(),
                html,
            })
        }
    }

    fn extractor(html: Option<&str>) -> ArticleExtractor {
        ArticleExtractor::new(
            Arc::new(OnePage(html.map(str::to_string))),
            Arc::new(catalog()),
            Arc::new(Classifier::new(Arc::new(LexicalAnalyzer::new()))),
        )
    }

    #[test]
    fn test_boilerplate_is_stripped() {
        let html = r#"<div class="entry-content">
            <header>Menú</header>
            <p>El compost <b>casero</b> mejora el suelo.</p>
            <script>var x = 1;</script><style>p{}</style>
            <aside>Publicidad</aside>
            <p>Se hace en tres meses.</p>
            <footer>© Blog</footer>
        </div>"#;
        let parsed = parse_article(html, &catalog());
        assert_eq!(parsed.content, "El compost casero mejora el suelo. Se hace en tres meses.");
    }

    #[test]
    fn test_title_and_date() {
        let html = r#"<html><head><title>Blog | Poda</title></head><body>
            <h1 class="entry-title">Poda de rosales</h1>
            <time class="entry-date" datetime="2023-06-14T09:30:00+02:00">14 junio</time>
            <div class="post-content"><p>Texto.</p></div></body></html>"#;
        let parsed = parse_article(html, &catalog());
        assert_eq!(parsed.title, "Poda de rosales");
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2023, 6, 14));
        assert_eq!(parsed.content, "Texto.");
    }

    #[test]
    fn test_unparseable_date_is_omitted() {
        let html = r#"<h1>T</h1><time datetime="ayer">ayer</time>"#;
        assert!(parse_article(html, &catalog()).date.is_none());
    }

    #[test]
    fn test_jsonld_fallbacks() {
        let html = r#"<script type="application/ld+json">
            {"@type":"BlogPosting","headline":"Huerta urbana","datePublished":"2022-01-05"}
        </script><div class="content">Cuerpo</div>"#;
        let parsed = parse_article(html, &catalog());
        assert_eq!(parsed.title, "Huerta urbana");
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2022, 1, 5));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date(" 05/03/2021 "), NaiveDate::from_ymd_opt(2021, 3, 5));
        assert!(parse_date("2023-13-40").is_none());
        assert!(parse_date("").is_none());
    }

    #[tokio::test]
    async fn test_extract_classifies() {
        let html = r#"<h1>Cómo regar</h1><div class="entry-content">
            Riega la planta. Corta las hojas. Abona el suelo. Observa resultados.</div>"#;
        let draft = extractor(Some(html)).extract("https://blog.example.com/regar").await.unwrap();
        assert_eq!(draft.title, "Cómo regar");
        assert_eq!(draft.category, Category::Practice);
        assert_eq!(draft.url, "https://blog.example.com/regar");
        assert!(draft.validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_fields_degrade_to_placeholders() {
        let draft = extractor(Some("<p>nada útil</p>"))
            .extract("https://blog.example.com/vacio")
            .await
            .unwrap();
        assert_eq!(draft.title, UNTITLED_PLACEHOLDER);
        assert_eq!(draft.content, MISSING_CONTENT_PLACEHOLDER);
        assert_eq!(draft.level, Level::Basic);
        assert!(draft.validate().is_ok());
    }

    #[tokio::test]
    async fn test_unfetchable_page() {
        assert!(extractor(None).extract("https://blog.example.com/x").await.is_none());
    }
}
