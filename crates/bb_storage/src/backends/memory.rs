use async_trait::async_trait;
use bb_core::{Article, ArticleDraft, ArticleStorage, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::{accept_draft, StorageBackend, StorageConfig};

/// Articles in insertion order plus a URL index into them.
#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    by_url: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    /// Inserts the article unless its URL is taken. Index and vector are
    /// updated together under the caller's write lock.
    pub fn insert(&mut self, article: Article) -> bool {
        if self.exists(&article.url) {
            return false;
        }
        self.by_url.insert(article.url.clone(), self.articles.len());
        self.articles.push(article);
        true
    }

    pub fn set_chapter(&mut self, url: &str, chapter: Option<&str>) -> bool {
        match self.by_url.get(url) {
            Some(&idx) => {
                self.articles[idx].chapter = chapter.map(str::to_string);
                true
            }
            None => false,
        }
    }

    pub fn all(&self) -> Vec<Article> {
        self.articles.clone()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn for_chapter(&self, chapter: &str) -> Vec<Article> {
        self.articles
            .iter()
            .filter(|a| a.chapter.as_deref() == Some(chapter))
            .cloned()
            .collect()
    }
}

/// Volatile store, mostly for tests and dry runs.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    session_id: String,
}

impl MemoryStorage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        Ok(Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
            session_id: config.session_id.clone(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new(config: &StorageConfig) -> Result<Self> where Self: Sized {
        MemoryStorage::new(config).await
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        Ok(self.store.read().await.exists(url))
    }

    async fn save(&self, draft: &ArticleDraft) -> bool {
        if !accept_draft(draft) {
            return false;
        }
        let mut store = self.store.write().await;
        if !store.insert(Article::from(draft.clone())) {
            tracing::warn!("⚠️ Article already stored, skipping: {}", draft.url);
            return false;
        }
        true
    }

    async fn all(&self) -> Result<Vec<Article>> {
        Ok(self.store.read().await.all())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.read().await.len())
    }

    async fn set_chapter(&self, url: &str, chapter: Option<&str>) -> Result<bool> {
        Ok(self.store.write().await.set_chapter(url, chapter))
    }

    async fn for_chapter(&self, chapter: &str) -> Result<Vec<Article>> {
        Ok(self.store.read().await.for_chapter(chapter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::{Category, Level};

    fn draft(url: &str, content: &str) -> ArticleDraft {
        ArticleDraft {
            title: "Test Article".to_string(),
            content: content.to_string(),
            url: url.to_string(),
            date: None,
            category: Category::Theory,
            level: Level::Basic,
        }
    }

    async fn storage() -> MemoryStorage {
        MemoryStorage::new(&StorageConfig::new("unused", "test")).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_is_idempotent_per_url() {
        let storage = storage().await;
        let first = draft("http://test.com/a", "original body");
        assert!(storage.save(&first).await);
        assert!(!storage.save(&draft("http://test.com/a", "changed body")).await);

        let all = storage.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "original body");
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_stored() {
        let storage = storage().await;
        assert!(!storage.save(&draft("http://test.com/a", "")).await);
        assert_eq!(storage.count().await.unwrap(), 0);
        assert!(!storage.exists("http://test.com/a").await.unwrap());
    }

    #[tokio::test]
    async fn test_chapter_assignment() {
        let storage = storage().await;
        storage.save(&draft("http://test.com/a", "uno")).await;
        storage.save(&draft("http://test.com/b", "dos")).await;

        assert!(storage.set_chapter("http://test.com/b", Some("riego")).await.unwrap());
        assert!(!storage.set_chapter("http://test.com/zzz", Some("riego")).await.unwrap());

        let riego = storage.for_chapter("riego").await.unwrap();
        assert_eq!(riego.len(), 1);
        assert_eq!(riego[0].url, "http://test.com/b");

        let urls: Vec<_> = storage.all().await.unwrap().into_iter().map(|a| a.url).collect();
        assert_eq!(urls, vec!["http://test.com/a", "http://test.com/b"]);
    }
}
