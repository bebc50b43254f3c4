use std::fmt;
use std::sync::Arc;

use bb_core::types::truncate_chars;
use bb_core::{Article, CaseStudyEntry, PracticeEntry, TextAnalyzer, TheoryEntry};

#[derive(Debug, Clone)]
pub struct FormatConfig {
    pub theory_chars: usize,
    pub context_chars: usize,
    pub max_concepts: usize,
    pub max_steps: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            theory_chars: 1000,
            context_chars: 500,
            max_concepts: 5,
            max_steps: 5,
        }
    }
}

/// Turns stored articles into the summaries a chapter section holds.
pub struct ArticleFormatter {
    analyzer: Arc<dyn TextAnalyzer>,
    config: FormatConfig,
}

impl fmt::Debug for ArticleFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleFormatter")
            .field("analyzer", &self.analyzer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ArticleFormatter {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>, config: FormatConfig) -> Self {
        Self { analyzer, config }
    }

    pub fn theory(&self, article: &Article) -> TheoryEntry {
        let mut content = truncate_chars(&article.content, self.config.theory_chars);
        if content.len() < article.content.len() {
            content.push_str("...");
        }
        TheoryEntry {
            title: article.title.clone(),
            content,
            key_concepts: self.analyzer.key_concepts(&article.content, self.config.max_concepts),
        }
    }

    /// Steps are sentences that mention a "paso" or open with an imperative.
    pub fn practice(&self, article: &Article) -> PracticeEntry {
        let steps = self
            .analyzer
            .sentences(&article.content)
            .into_iter()
            .filter(|s| s.to_lowercase().contains("paso") || self.analyzer.starts_with_imperative(s))
            .take(self.config.max_steps)
            .collect();
        PracticeEntry {
            title: article.title.clone(),
            steps,
            materials: self.analyzer.materials(&article.content),
        }
    }

    pub fn case_study(&self, article: &Article) -> CaseStudyEntry {
        CaseStudyEntry {
            title: article.title.clone(),
            context: truncate_chars(&article.content, self.config.context_chars),
            results: self.analyzer.percentages(&article.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::{Category, Level};
    use bb_inference::LexicalAnalyzer;

    fn formatter() -> ArticleFormatter {
        ArticleFormatter::new(Arc::new(LexicalAnalyzer::new()), FormatConfig::default())
    }

    fn article(content: &str) -> Article {
        Article {
            url: "https://blog.example.com/a".to_string(),
            title: "Título".to_string(),
            content: content.to_string(),
            date: None,
            category: Category::Theory,
            level: Level::Basic,
            chapter: None,
        }
    }

    #[test]
    fn test_theory_truncation() {
        let long = "á".repeat(1500);
        let entry = formatter().theory(&article(&long));
        assert_eq!(entry.content.chars().count(), 1003);
        assert!(entry.content.ends_with("..."));

        let short = formatter().theory(&article("Texto breve sobre la Permacultura."));
        assert_eq!(short.content, "Texto breve sobre la Permacultura.");
        assert_eq!(short.key_concepts, vec!["Permacultura"]);
    }

    #[test]
    fn test_practice_steps() {
        let text = "Necesitarás: pala y guantes. Primer paso: elegir el lugar. \
                    Cava un hoyo profundo. El suelo debe drenar. Coloca la planta. \
                    Riega abundante. Observa cada día. Cubre con mantillo.";
        let entry = formatter().practice(&article(text));
        assert_eq!(
            entry.steps,
            vec![
                "Primer paso: elegir el lugar",
                "Cava un hoyo profundo",
                "Coloca la planta",
                "Riega abundante",
                "Observa cada día",
            ]
        );
        assert_eq!(entry.materials, vec!["pala", "guantes"]);
    }

    #[test]
    fn test_case_study() {
        let text = format!("{} El rendimiento subió 40%.", "x".repeat(600));
        let entry = formatter().case_study(&article(&text));
        assert_eq!(entry.context.chars().count(), 500);
        assert_eq!(entry.results, vec!["40%"]);
    }
}
