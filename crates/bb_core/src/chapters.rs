use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::Category;

/// Chapter key used when an article matches no topic.
pub const GENERAL_CHAPTER: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheoryEntry {
    pub title: String,
    pub content: String,
    pub key_concepts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeEntry {
    pub title: String,
    pub steps: Vec<String>,
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudyEntry {
    pub title: String,
    pub context: String,
    pub results: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub answer_hint: String,
}

/// One chapter of the book. All four sections are always serialized,
/// empty or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub theory: Vec<TheoryEntry>,
    pub practice: Vec<PracticeEntry>,
    pub case_study: Vec<CaseStudyEntry>,
    pub quizzes: Vec<Quiz>,
}

impl Chapter {
    pub fn section_len(&self, category: Category) -> usize {
        match category {
            Category::Theory => self.theory.len(),
            Category::Practice => self.practice.len(),
            Category::CaseStudy => self.case_study.len(),
        }
    }

    pub fn article_count(&self) -> usize {
        self.theory.len() + self.practice.len() + self.case_study.len()
    }
}

/// Chapters keyed by label, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterStructure {
    chapters: Vec<(String, Chapter)>,
}

impl ChapterStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chapter for `label`, creating an empty one at the end
    /// if it does not exist yet.
    pub fn chapter_mut(&mut self, label: &str) -> &mut Chapter {
        let idx = match self.chapters.iter().position(|(l, _)| l == label) {
            Some(idx) => idx,
            None => {
                self.chapters.push((label.to_string(), Chapter::default()));
                self.chapters.len() - 1
            }
        };
        &mut self.chapters[idx].1
    }

    pub fn get(&self, label: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|(l, _)| l == label).map(|(_, c)| c)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.chapters.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Chapter)> {
        self.chapters.iter().map(|(l, c)| (l.as_str(), c))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Chapter)> {
        self.chapters.iter_mut().map(|(l, c)| (l.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

impl Serialize for ChapterStructure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.chapters.len()))?;
        for (label, chapter) in &self.chapters {
            map.serialize_entry(label, chapter)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChapterStructure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct StructureVisitor;

        impl<'de> Visitor<'de> for StructureVisitor {
            type Value = ChapterStructure;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of chapter label to chapter")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut structure = ChapterStructure::new();
                while let Some((label, chapter)) = access.next_entry::<String, Chapter>()? {
                    *structure.chapter_mut(&label) = chapter;
                }
                Ok(structure)
            }
        }

        deserializer.deserialize_map(StructureVisitor)
    }
}
