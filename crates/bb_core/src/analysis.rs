use std::fmt;

use async_trait::async_trait;

use crate::Result;

/// Shallow lexical analysis of Spanish prose.
///
/// Implementations are built once and shared behind an `Arc` by the
/// classifier and the chapter formatter; they must not keep mutable state.
pub trait TextAnalyzer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Number of tokens that read as imperative-mood verbs.
    fn imperative_verb_count(&self, text: &str) -> usize;

    /// Sentences of `text`, trimmed, in order.
    fn sentences(&self, text: &str) -> Vec<String>;

    /// True if the sentence opens with an imperative verb.
    fn starts_with_imperative(&self, sentence: &str) -> bool;

    /// Salient named concepts, at most `limit`.
    fn key_concepts(&self, text: &str, limit: usize) -> Vec<String>;

    /// Materials or tools the text says are needed.
    fn materials(&self, text: &str) -> Vec<String>;

    /// Percentage figures quoted in the text.
    fn percentages(&self, text: &str) -> Vec<String>;
}

/// Produces a quiz question about a chapter topic.
#[async_trait]
pub trait QuestionGenerator: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    async fn generate_question(&self, topic: &str) -> Result<String>;
}
