use std::fmt;
use std::sync::Arc;

use bb_core::{Article, Category, ChapterStructure, QuestionGenerator, Quiz, TextAnalyzer, GENERAL_CHAPTER};
use bb_inference::{TemplateQuestions, TopicModel};

use crate::format::{ArticleFormatter, FormatConfig};

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub quizzes_per_chapter: usize,
    /// `{topic}` is replaced by the chapter label.
    pub answer_hint_template: String,
    pub format: FormatConfig,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            quizzes_per_chapter: 3,
            answer_hint_template: "Review the section: {topic}".to_string(),
            format: FormatConfig::default(),
        }
    }
}

/// The assembled book plus the chapter each article was filed under.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub structure: ChapterStructure,
    /// `(url, chapter)` per article, first matching chapter only.
    pub assignments: Vec<(String, String)>,
}

/// Files articles into chapters by topic and category, then adds quizzes.
pub struct ChapterAssembler {
    formatter: ArticleFormatter,
    questions: Arc<dyn QuestionGenerator>,
    fallback: TemplateQuestions,
    config: AssemblerConfig,
}

impl fmt::Debug for ChapterAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChapterAssembler")
            .field("questions", &self.questions.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ChapterAssembler {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>, questions: Arc<dyn QuestionGenerator>, config: AssemblerConfig) -> Self {
        Self {
            formatter: ArticleFormatter::new(analyzer, config.format.clone()),
            questions,
            fallback: TemplateQuestions::default(),
            config,
        }
    }

    /// Every topic gets a chapter, even an empty one. Articles matching no
    /// topic, or all articles when there are no topics, go to "General".
    pub async fn assemble(&self, articles: &[Article], topics: &TopicModel) -> Assembly {
        let mut assembly = Assembly::default();
        for label in &topics.labels {
            assembly.structure.chapter_mut(label);
        }

        for (index, article) in articles.iter().enumerate() {
            let mut chapters = topics.chapters_for(index, article);
            if chapters.is_empty() {
                chapters.push(GENERAL_CHAPTER);
            }
            for label in &chapters {
                self.file(&mut assembly.structure, label, article);
            }
            assembly.assignments.push((article.url.clone(), chapters[0].to_string()));
        }

        let labels: Vec<String> = assembly.structure.labels().map(str::to_string).collect();
        for label in labels {
            let quizzes = self.quizzes(&label).await;
            assembly.structure.chapter_mut(&label).quizzes = quizzes;
        }

        tracing::info!(
            "📚 Assembled {} chapters from {} articles",
            assembly.structure.len(),
            articles.len()
        );
        assembly
    }

    fn file(&self, structure: &mut ChapterStructure, label: &str, article: &Article) {
        let chapter = structure.chapter_mut(label);
        match article.category {
            Category::Theory => chapter.theory.push(self.formatter.theory(article)),
            Category::Practice => chapter.practice.push(self.formatter.practice(article)),
            Category::CaseStudy => chapter.case_study.push(self.formatter.case_study(article)),
        }
    }

    async fn quizzes(&self, label: &str) -> Vec<Quiz> {
        let answer_hint = self.config.answer_hint_template.replace("{topic}", label);
        let mut quizzes = Vec::with_capacity(self.config.quizzes_per_chapter);
        for _ in 0..self.config.quizzes_per_chapter {
            let question = match self.questions.generate_question(label).await {
                Ok(q) if !q.trim().is_empty() => q,
                Ok(_) => self.fallback.render(label),
                Err(e) => {
                    tracing::warn!("⚠️ Question generation failed for {}: {}", label, e);
                    self.fallback.render(label)
                }
            };
            quizzes.push(Quiz {
                question,
                answer_hint: answer_hint.clone(),
            });
        }
        quizzes
    }
}
