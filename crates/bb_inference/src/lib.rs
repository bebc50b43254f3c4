pub mod analyzer;
pub mod classifier;
pub mod kmeans;
pub mod lexicon;
pub mod questions;
pub mod tfidf;
pub mod topics;

pub use analyzer::LexicalAnalyzer;
pub use classifier::{lexical_diversity, Classifier, ClassifierConfig};
pub use questions::{create_generator, FallbackQuestions, QuestionConfig, TemplateQuestions};
pub use topics::{matches_label, AssignmentMode, ClusterConfig, TopicClusterer, TopicModel};

pub mod prelude {
    pub use super::analyzer::LexicalAnalyzer;
    pub use super::classifier::{Classifier, ClassifierConfig};
    pub use super::questions::{create_generator, QuestionConfig};
    pub use super::topics::{AssignmentMode, ClusterConfig, TopicClusterer, TopicModel};
    pub use bb_core::{Article, Category, Error, Level, QuestionGenerator, Result, TextAnalyzer};
}
