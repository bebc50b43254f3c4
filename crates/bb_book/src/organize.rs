use std::sync::Arc;

use bb_core::{ArticleStorage, Error, Result};
use bb_inference::TopicClusterer;

use crate::assembler::{Assembly, ChapterAssembler};

/// Reads the whole corpus from a store, clusters it, assembles the book
/// and writes each article's chapter back to the store.
pub struct BookOrganizer {
    storage: Arc<dyn ArticleStorage>,
    clusterer: TopicClusterer,
    assembler: ChapterAssembler,
}

impl BookOrganizer {
    pub fn new(storage: Arc<dyn ArticleStorage>, clusterer: TopicClusterer, assembler: ChapterAssembler) -> Self {
        Self {
            storage,
            clusterer,
            assembler,
        }
    }

    pub async fn organize(&self) -> Result<Assembly> {
        let articles = self.storage.all().await?;
        if articles.is_empty() {
            return Err(Error::EmptyCorpus(
                "the store holds no articles to build chapters from".to_string(),
            ));
        }
        tracing::info!("🧠 Clustering {} articles", articles.len());

        let clusterer = self.clusterer.clone();
        let corpus = articles.clone();
        let topics = tokio::task::spawn_blocking(move || clusterer.cluster(&corpus))
            .await
            .map_err(|e| Error::Inference(format!("clustering task failed: {}", e)))?;

        let assembly = self.assembler.assemble(&articles, &topics).await;

        let mut updated = 0;
        for (url, chapter) in &assembly.assignments {
            if self.storage.set_chapter(url, Some(chapter.as_str())).await? {
                updated += 1;
            }
        }
        tracing::debug!("Chapter stored for {} articles", updated);

        Ok(assembly)
    }
}
