use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bb_core::{Category, Level, TextAnalyzer};

use crate::lexicon::CASE_STUDY_PHRASES;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// More imperatives than this makes an article practice.
    pub imperative_threshold: usize,
    pub case_study_phrases: Vec<String>,
    /// Diversity percentage below which an article is basic.
    pub basic_below: usize,
    /// Diversity percentage from which an article is expert.
    pub expert_from: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            imperative_threshold: 3,
            case_study_phrases: CASE_STUDY_PHRASES.iter().map(|s| s.to_string()).collect(),
            basic_below: 30,
            expert_from: 60,
        }
    }
}

/// Assigns category and level from cleaned body text. Pure: the same text
/// always yields the same pair.
pub struct Classifier {
    analyzer: Arc<dyn TextAnalyzer>,
    config: ClassifierConfig,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("analyzer", &self.analyzer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Classifier {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self::with_config(analyzer, ClassifierConfig::default())
    }

    pub fn with_config(analyzer: Arc<dyn TextAnalyzer>, config: ClassifierConfig) -> Self {
        let config = ClassifierConfig {
            case_study_phrases: config
                .case_study_phrases
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            ..config
        };
        Self { analyzer, config }
    }

    pub fn analyzer(&self) -> Arc<dyn TextAnalyzer> {
        Arc::clone(&self.analyzer)
    }

    pub fn classify(&self, text: &str) -> (Category, Level) {
        (self.category(text), self.level(text))
    }

    pub fn category(&self, text: &str) -> Category {
        if self.analyzer.imperative_verb_count(text) > self.config.imperative_threshold {
            return Category::Practice;
        }
        let lower = text.to_lowercase();
        if self
            .config
            .case_study_phrases
            .iter()
            .any(|phrase| lower.contains(phrase.as_str()))
        {
            return Category::CaseStudy;
        }
        Category::Theory
    }

    pub fn level(&self, text: &str) -> Level {
        let (unique, total) = token_counts(text);
        if total == 0 {
            return Level::Basic;
        }
        // Compared as integers so the thresholds are exact.
        let scaled = unique * 100;
        if scaled < self.config.basic_below * total {
            Level::Basic
        } else if scaled < self.config.expert_from * total {
            Level::Intermediate
        } else {
            Level::Expert
        }
    }
}

/// Distinct whitespace tokens over total tokens, as a percentage.
/// Empty text scores 0.
pub fn lexical_diversity(text: &str) -> f64 {
    let (unique, total) = token_counts(text);
    if total == 0 {
        return 0.0;
    }
    unique as f64 / total as f64 * 100.0
}

fn token_counts(text: &str) -> (usize, usize) {
    let mut seen = HashSet::new();
    let mut total = 0;
    for token in text.split_whitespace() {
        seen.insert(token);
        total += 1;
    }
    (seen.len(), total)
}
