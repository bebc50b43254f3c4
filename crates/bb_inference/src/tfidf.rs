//! TF-IDF vectorization over unigrams and bigrams.
//!
//! Smoothed idf (`ln((1 + n) / (1 + df)) + 1`) and l2-normalised rows, with
//! the vocabulary capped to the most frequent terms across the corpus and
//! then sorted alphabetically.

use std::collections::{BTreeMap, HashMap};

use crate::lexicon::is_stopword;

/// Lowercases, splits on anything that is not a letter or digit, keeps
/// tokens of at least two characters and drops stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

/// Unigrams followed by bigrams of adjacent kept tokens.
pub fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut grams: Vec<String> = tokens.to_vec();
    grams.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    grams
}

#[derive(Debug, Clone)]
pub struct TfIdfMatrix {
    pub vocabulary: Vec<String>,
    /// One dense, l2-normalised row per document.
    pub rows: Vec<Vec<f64>>,
}

impl TfIdfMatrix {
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty() || self.rows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    max_features: usize,
}

impl TfIdfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    pub fn fit_transform(&self, documents: &[String]) -> TfIdfMatrix {
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut tf = HashMap::new();
                for gram in ngrams(&tokenize(doc)) {
                    *tf.entry(gram).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let vocabulary = self.select_vocabulary(&counts);
        if vocabulary.is_empty() {
            return TfIdfMatrix {
                vocabulary,
                rows: vec![Vec::new(); documents.len()],
            };
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|term| {
                let df = counts.iter().filter(|tf| tf.contains_key(term)).count() as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows = counts
            .iter()
            .map(|tf| {
                let mut row: Vec<f64> = vocabulary
                    .iter()
                    .zip(&idf)
                    .map(|(term, w)| tf.get(term).copied().unwrap_or(0) as f64 * w)
                    .collect();
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.iter_mut().for_each(|v| *v /= norm);
                }
                row
            })
            .collect();

        TfIdfMatrix { vocabulary, rows }
    }

    fn select_vocabulary(&self, counts: &[HashMap<String, usize>]) -> Vec<String> {
        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for tf in counts {
            for (term, count) in tf {
                *totals.entry(term.as_str()).or_insert(0) += count;
            }
        }

        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();
        vocabulary
    }
}
