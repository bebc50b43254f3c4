use std::fmt;
use std::path::Path;

use bb_core::{Chapter, ChapterStructure, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Writes the structure as pretty JSON, creating parent directories.
pub fn write_structure(path: &Path, structure: &ChapterStructure) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(structure)?;
    std::fs::write(path, json)?;
    tracing::info!("💾 Wrote {} chapters to {}", structure.len(), path.display());
    Ok(())
}

/// Reads a structure written for the renderer. Chapters that are not a
/// complete record (any of the four sections missing or malformed) are
/// skipped with a warning; the rest keep their order.
pub fn load_structure(path: &Path) -> Result<ChapterStructure> {
    let raw = std::fs::read_to_string(path)?;
    parse_structure(&raw)
}

pub fn parse_structure(raw: &str) -> Result<ChapterStructure> {
    let lenient: LenientStructure = serde_json::from_str(raw)?;
    Ok(lenient.0)
}

struct LenientStructure(ChapterStructure);

impl<'de> Deserialize<'de> for LenientStructure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct LenientVisitor;

        impl<'de> Visitor<'de> for LenientVisitor {
            type Value = LenientStructure;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of chapter label to chapter")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut structure = ChapterStructure::new();
                while let Some((label, value)) = access.next_entry::<String, Value>()? {
                    match serde_json::from_value::<Chapter>(value) {
                        Ok(chapter) => *structure.chapter_mut(&label) = chapter,
                        Err(e) => tracing::warn!("⚠️ Skipping incomplete chapter {:?}: {}", label, e),
                    }
                }
                Ok(LenientStructure(structure))
            }
        }

        deserializer.deserialize_map(LenientVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::{Quiz, TheoryEntry, GENERAL_CHAPTER};
    use tempfile::tempdir;

    #[test]
    fn test_write_then_load() {
        let mut structure = ChapterStructure::new();
        structure.chapter_mut("riego, agua, goteo").theory.push(TheoryEntry {
            title: "Riego".to_string(),
            content: "...".to_string(),
            key_concepts: vec![],
        });
        structure.chapter_mut(GENERAL_CHAPTER).quizzes.push(Quiz {
            question: "¿Qué?".to_string(),
            answer_hint: "Review the section: General".to_string(),
        });

        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("book.json");
        write_structure(&path, &structure).unwrap();
        assert_eq!(load_structure(&path).unwrap(), structure);
    }

    #[test]
    fn test_incomplete_chapters_are_skipped() {
        let raw = r#"{
            "poda": {"theory": [], "practice": [], "case_study": []},
            "compost": {"theory": [], "practice": [], "case_study": [], "quizzes": []},
            "riego": "not a chapter",
            "General": {"theory": [], "practice": [], "case_study": [], "quizzes": []}
        }"#;
        let structure = parse_structure(raw).unwrap();
        assert_eq!(structure.labels().collect::<Vec<_>>(), vec!["compost", GENERAL_CHAPTER]);
    }

    #[test]
    fn test_not_a_map_is_an_error() {
        assert!(parse_structure("[1, 2]").is_err());
        assert!(load_structure(Path::new("/nonexistent/book.json")).is_err());
    }
}
