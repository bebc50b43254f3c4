use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Maximum number of characters kept from an article title.
pub const TITLE_MAX_CHARS: usize = 500;

/// Stored in place of a title no selector could find.
pub const UNTITLED_PLACEHOLDER: &str = "Sin título";

/// Stored in place of a body no selector could find.
pub const MISSING_CONTENT_PLACEHOLDER: &str = "Contenido no disponible";

/// Pedagogical role of an article inside a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Theory,
    Practice,
    CaseStudy,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Theory, Category::Practice, Category::CaseStudy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Theory => "theory",
            Category::Practice => "practice",
            Category::CaseStudy => "case_study",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "theory" => Ok(Category::Theory),
            "practice" => Ok(Category::Practice),
            "case_study" => Ok(Category::CaseStudy),
            other => Err(Error::Validation(format!("unknown category: {}", other))),
        }
    }
}

/// Reading difficulty estimated from lexical diversity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Basic,
    Intermediate,
    Expert,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Basic, Level::Intermediate, Level::Expert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Basic => "basic",
            Level::Intermediate => "intermediate",
            Level::Expert => "expert",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(Level::Basic),
            "intermediate" => Ok(Level::Intermediate),
            "expert" => Ok(Level::Expert),
            other => Err(Error::Validation(format!("unknown level: {}", other))),
        }
    }
}

/// An extracted and classified page, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub url: String,
    pub date: Option<NaiveDate>,
    pub category: Category,
    pub level: Level,
}

impl ArticleDraft {
    /// Checks the required fields before the draft reaches a store.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Validation("url is empty".to_string()));
        }
        let parsed = Url::parse(&self.url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("unsupported scheme: {}", self.url)));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation(format!("title is empty for {}", self.url)));
        }
        if self.content.trim().is_empty() {
            return Err(Error::Validation(format!("content is empty for {}", self.url)));
        }
        Ok(())
    }

    /// Title cut down to [`TITLE_MAX_CHARS`] characters.
    pub fn bounded_title(&self) -> String {
        truncate_chars(&self.title, TITLE_MAX_CHARS)
    }
}

/// A persisted article. `chapter` stays empty until topic clustering runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub content: String,
    pub date: Option<NaiveDate>,
    pub category: Category,
    pub level: Level,
    pub chapter: Option<String>,
}

impl From<ArticleDraft> for Article {
    fn from(draft: ArticleDraft) -> Self {
        let title = draft.bounded_title();
        Self {
            url: draft.url,
            title,
            content: draft.content,
            date: draft.date,
            category: draft.category,
            level: draft.level,
            chapter: None,
        }
    }
}

/// Keeps at most `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ArticleDraft {
        ArticleDraft {
            title: "Riego por goteo".to_string(),
            content: "El riego por goteo ahorra agua.".to_string(),
            url: "https://blog.example.com/riego".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            category: Category::Theory,
            level: Level::Basic,
        }
    }

    #[test]
    fn test_validate_accepts_complete_draft() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut d = draft();
        d.content = "   ".to_string();
        assert!(matches!(d.validate(), Err(Error::Validation(_))));

        let mut d = draft();
        d.url = "ftp://blog.example.com/x".to_string();
        assert!(matches!(d.validate(), Err(Error::InvalidUrl(_))));

        let mut d = draft();
        d.url = "not a url".to_string();
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_article_from_draft_truncates_title() {
        let mut d = draft();
        d.title = "ñ".repeat(TITLE_MAX_CHARS + 20);
        let article = Article::from(d);
        assert_eq!(article.title.chars().count(), TITLE_MAX_CHARS);
        assert!(article.chapter.is_none());
    }

    #[test]
    fn test_enum_round_trip_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
        assert!("advanced".parse::<Level>().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(draft()).unwrap();
        assert_eq!(json["category"], "theory");
        assert_eq!(json["level"], "basic");
        assert_eq!(json["date"], "2024-03-01");

        let mut d = draft();
        d.date = None;
        d.category = Category::CaseStudy;
        let json = serde_json::to_value(d).unwrap();
        assert!(json["date"].is_null());
        assert_eq!(json["category"], "case_study");
    }
}
