use std::str::FromStr;

use bb_core::{Article, Error, Result};

use crate::kmeans::{KMeans, KMeansConfig};
use crate::tfidf::TfIdfVectorizer;

/// How articles are mapped onto topic labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentMode {
    /// An article joins every chapter whose label occurs in its content.
    #[default]
    Containment,
    /// An article joins the chapter of the cluster it was placed in.
    ClusterIndex,
}

impl FromStr for AssignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "containment" | "substring" => Ok(AssignmentMode::Containment),
            "cluster" | "cluster-index" | "cluster_index" => Ok(AssignmentMode::ClusterIndex),
            other => Err(Error::Validation(format!("unknown assignment mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub clusters: usize,
    pub top_terms: usize,
    pub max_features: usize,
    pub seed: u64,
    pub n_init: usize,
    pub mode: AssignmentMode,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            clusters: 5,
            top_terms: 3,
            max_features: 1000,
            seed: 42,
            n_init: 10,
            mode: AssignmentMode::Containment,
        }
    }
}

/// Topic labels for a corpus plus the cluster each article fell in.
#[derive(Debug, Clone, Default)]
pub struct TopicModel {
    pub labels: Vec<String>,
    /// Index into `labels` per clustered article, `None` when the cluster
    /// produced no usable label.
    pub cluster_of: Vec<Option<usize>>,
    pub mode: AssignmentMode,
}

impl TopicModel {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels the article at `index` belongs to. May be empty, or hold more
    /// than one label in containment mode.
    pub fn chapters_for(&self, index: usize, article: &Article) -> Vec<&str> {
        match self.mode {
            AssignmentMode::Containment => self
                .labels
                .iter()
                .filter(|label| matches_label(label, &article.content))
                .map(String::as_str)
                .collect(),
            AssignmentMode::ClusterIndex => self
                .cluster_of
                .get(index)
                .copied()
                .flatten()
                .and_then(|i| self.labels.get(i))
                .map(|label| vec![label.as_str()])
                .unwrap_or_default(),
        }
    }
}

/// Case-insensitive containment of the whole label in the text.
pub fn matches_label(label: &str, text: &str) -> bool {
    !label.is_empty() && text.to_lowercase().contains(&label.to_lowercase())
}

#[derive(Debug, Clone)]
pub struct TopicClusterer {
    config: ClusterConfig,
}

impl TopicClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn cluster(&self, articles: &[Article]) -> TopicModel {
        let mode = self.config.mode;
        if articles.is_empty() {
            return TopicModel {
                mode,
                ..TopicModel::default()
            };
        }

        let documents: Vec<String> = articles
            .iter()
            .map(|a| format!("{} {}", a.title, a.content))
            .collect();
        let matrix = TfIdfVectorizer::new(self.config.max_features).fit_transform(&documents);
        if matrix.is_empty() {
            tracing::warn!("⚠️ No terms left after vectorization, skipping clustering");
            return TopicModel {
                cluster_of: vec![None; articles.len()],
                mode,
                ..TopicModel::default()
            };
        }

        let kmeans = KMeans::new(KMeansConfig {
            clusters: self.config.clusters,
            seed: self.config.seed,
            n_init: self.config.n_init,
            ..KMeansConfig::default()
        });
        let result = kmeans.fit(&matrix.rows);

        let mut labels: Vec<String> = Vec::new();
        let mut label_of_cluster: Vec<Option<usize>> = Vec::with_capacity(result.centroids.len());
        for centroid in &result.centroids {
            let label = top_terms(centroid, &matrix.vocabulary, self.config.top_terms).join(", ");
            if label.is_empty() {
                label_of_cluster.push(None);
                continue;
            }
            let idx = match labels.iter().position(|l| *l == label) {
                Some(existing) => existing,
                None => {
                    labels.push(label);
                    labels.len() - 1
                }
            };
            label_of_cluster.push(Some(idx));
        }

        let cluster_of = result
            .labels
            .iter()
            .map(|&c| label_of_cluster.get(c).copied().flatten())
            .collect();

        tracing::info!("🧩 Clustered {} articles into {} topics", articles.len(), labels.len());
        for label in &labels {
            tracing::debug!("Topic: {}", label);
        }

        TopicModel {
            labels,
            cluster_of,
            mode,
        }
    }
}

/// Highest weighted terms of a centroid, strongest first. Ties keep
/// vocabulary order; zero weights never qualify.
fn top_terms(centroid: &[f64], vocabulary: &[String], n: usize) -> Vec<String> {
    let mut order: Vec<usize> = (0..centroid.len()).filter(|&i| centroid[i] > 0.0).collect();
    order.sort_by(|&a, &b| centroid[b].total_cmp(&centroid[a]).then(a.cmp(&b)));
    order
        .into_iter()
        .take(n)
        .map(|i| vocabulary[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::{Category, Level};

    fn article(url: &str, title: &str, content: &str) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            date: None,
            category: Category::Theory,
            level: Level::Basic,
            chapter: None,
        }
    }

    fn corpus() -> Vec<Article> {
        vec![
            article("https://b.example/1", "Riego", "riego goteo manguera riego goteo"),
            article("https://b.example/2", "Riego", "riego goteo aspersor riego goteo"),
            article("https://b.example/3", "Compost", "compost lombriz residuos compost lombriz"),
            article("https://b.example/4", "Compost", "compost lombriz cascara compost lombriz"),
        ]
    }

    fn clusterer(clusters: usize, mode: AssignmentMode) -> TopicClusterer {
        TopicClusterer::new(ClusterConfig {
            clusters,
            mode,
            ..ClusterConfig::default()
        })
    }

    #[test]
    fn test_empty_corpus_has_no_topics() {
        let model = clusterer(5, AssignmentMode::Containment).cluster(&[]);
        assert!(model.is_empty());
    }

    #[test]
    fn test_labels_are_top_terms() {
        let model = clusterer(2, AssignmentMode::ClusterIndex).cluster(&corpus());
        assert_eq!(model.labels.len(), 2);
        for label in &model.labels {
            assert_eq!(label.split(", ").count(), 3);
        }
        assert_eq!(model.cluster_of[0], model.cluster_of[1]);
        assert_eq!(model.cluster_of[2], model.cluster_of[3]);
        assert_ne!(model.cluster_of[0], model.cluster_of[2]);

        let articles = corpus();
        let riego = model.chapters_for(0, &articles[0]);
        assert_eq!(riego.len(), 1);
        assert!(riego[0].contains("riego"));
    }

    #[test]
    fn test_clustering_is_reproducible() {
        let a = clusterer(2, AssignmentMode::Containment).cluster(&corpus());
        let b = clusterer(2, AssignmentMode::Containment).cluster(&corpus());
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.cluster_of, b.cluster_of);
    }

    #[test]
    fn test_containment_mode() {
        let model = TopicModel {
            labels: vec!["riego goteo".to_string(), "compost".to_string()],
            cluster_of: vec![Some(0)],
            mode: AssignmentMode::Containment,
        };
        let both = article("https://b.example/x", "x", "El Riego Goteo usa compost.");
        assert_eq!(model.chapters_for(0, &both), vec!["riego goteo", "compost"]);
        let none = article("https://b.example/y", "y", "Nada que ver.");
        assert!(model.chapters_for(0, &none).is_empty());
    }

    #[test]
    fn test_matches_label() {
        assert!(matches_label("Compost, Suelo", "sobre compost, suelo y agua"));
        assert!(!matches_label("compost, suelo, agua", "compost y suelo"));
        assert!(!matches_label("", "cualquier texto"));
    }

    #[test]
    fn test_assignment_mode_from_str() {
        assert_eq!("cluster".parse::<AssignmentMode>().unwrap(), AssignmentMode::ClusterIndex);
        assert_eq!("containment".parse::<AssignmentMode>().unwrap(), AssignmentMode::Containment);
        assert!("random".parse::<AssignmentMode>().is_err());
    }

    #[test]
    fn test_top_terms_skip_zero_weights() {
        let vocab = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(top_terms(&[0.2, 0.0, 0.2], &vocab, 3), vec!["a", "c"]);
    }
}
