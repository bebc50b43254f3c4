pub mod analysis;
pub mod chapters;
pub mod error;
pub mod storage;
pub mod types;

pub use analysis::{QuestionGenerator, TextAnalyzer};
pub use chapters::{CaseStudyEntry, Chapter, ChapterStructure, PracticeEntry, Quiz, TheoryEntry, GENERAL_CHAPTER};
pub use error::{Error, Result};
pub use storage::ArticleStorage;
pub use types::{Article, ArticleDraft, Category, Level};
