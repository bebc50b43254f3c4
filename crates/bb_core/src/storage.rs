use async_trait::async_trait;
use crate::types::{Article, ArticleDraft};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Returns true if an article with this URL is already stored
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Persists a draft in a single transaction.
    ///
    /// Returns false, after logging the reason, when the draft is invalid or
    /// its URL is already present. Storage failures never propagate from here.
    async fn save(&self, draft: &ArticleDraft) -> bool;

    /// Every stored article, in insertion order
    async fn all(&self) -> Result<Vec<Article>>;

    /// Number of stored articles
    async fn count(&self) -> Result<usize>;

    /// Sets (or clears) the chapter label of a stored article.
    /// Returns false if no article has this URL.
    async fn set_chapter(&self, url: &str, chapter: Option<&str>) -> Result<bool>;

    /// Articles whose chapter label equals `chapter`
    async fn for_chapter(&self, chapter: &str) -> Result<Vec<Article>>;
}
