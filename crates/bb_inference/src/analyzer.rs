use bb_core::TextAnalyzer;

use crate::lexicon::{self, normalize_token, DETERMINERS, IMPERATIVES, MATERIAL_CUES};

/// Rule-based [`TextAnalyzer`] for Spanish, built from word lists.
#[derive(Debug, Default, Clone)]
pub struct LexicalAnalyzer;

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Imperatives within one sentence. The opener goes through
    /// `looks_imperative`; later tokens only count when they are known
    /// imperative forms not preceded by a determiner.
    fn imperatives_in_sentence(&self, sentence: &str) -> usize {
        let tokens: Vec<String> = sentence
            .split_whitespace()
            .map(normalize_token)
            .filter(|t| !t.is_empty())
            .collect();

        let first_word = tokens.iter().position(|t| t.chars().any(char::is_alphabetic));
        let mut count = 0;
        for (i, token) in tokens.iter().enumerate() {
            if Some(i) == first_word {
                if lexicon::looks_imperative(token) {
                    count += 1;
                }
            } else if IMPERATIVES.contains(token.as_str()) {
                let after_determiner = i > 0 && DETERMINERS.contains(tokens[i - 1].as_str());
                if !after_determiner {
                    count += 1;
                }
            }
        }
        count
    }
}

impl TextAnalyzer for LexicalAnalyzer {
    fn name(&self) -> &str {
        "lexical"
    }

    fn imperative_verb_count(&self, text: &str) -> usize {
        self.sentences(text)
            .iter()
            .map(|s| self.imperatives_in_sentence(s))
            .sum()
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut sentences = Vec::new();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            let is_decimal_point = c == '.'
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).map_or(false, |n| n.is_ascii_digit());
            let terminates = matches!(c, '.' | '!' | '?' | ';' | '\n') && !is_decimal_point;

            if terminates {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed.to_string());
                }
                current.clear();
            } else {
                current.push(c);
            }
        }
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
        sentences
    }

    fn starts_with_imperative(&self, sentence: &str) -> bool {
        sentence
            .split_whitespace()
            .map(normalize_token)
            .find(|t| t.chars().any(char::is_alphabetic))
            .map_or(false, |t| lexicon::looks_imperative(&t))
    }

    fn key_concepts(&self, text: &str, limit: usize) -> Vec<String> {
        let mut concepts: Vec<String> = Vec::new();

        for sentence in self.sentences(text) {
            let mut phrase: Vec<String> = Vec::new();
            let words: Vec<&str> = sentence.split_whitespace().collect();

            for (i, raw) in words.iter().enumerate() {
                let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
                let capitalized = word.chars().next().map_or(false, char::is_uppercase);
                let usable = i > 0
                    && capitalized
                    && word.chars().count() >= 3
                    && !lexicon::is_stopword(&word.to_lowercase());

                if usable {
                    phrase.push(word.to_string());
                }
                // Punctuation after a word closes the phrase.
                let closes = raw.ends_with(|c: char| !c.is_alphanumeric());
                if (!usable || closes) && !phrase.is_empty() {
                    push_unique(&mut concepts, phrase.join(" "));
                    phrase.clear();
                }
            }
            if !phrase.is_empty() {
                push_unique(&mut concepts, phrase.join(" "));
            }
            if concepts.len() >= limit {
                break;
            }
        }

        concepts.truncate(limit);
        concepts
    }

    fn materials(&self, text: &str) -> Vec<String> {
        let mut materials = Vec::new();

        for sentence in self.sentences(text) {
            let lower = sentence.to_lowercase();
            let Some((cue_at, cue)) = MATERIAL_CUES
                .iter()
                .filter_map(|cue| lower.find(cue).map(|at| (at, *cue)))
                .min_by_key(|(at, _)| *at)
            else {
                continue;
            };

            let after_cue = &lower[cue_at + cue.len()..];
            let list = match after_cue.find(':') {
                Some(colon) => &after_cue[colon + 1..],
                None => after_cue,
            };

            for item in list.split(',').flat_map(|part| part.split(" y ")) {
                let item = item.trim_matches(|c: char| !c.is_alphanumeric());
                let words = item.split_whitespace().count();
                if words > 0 && words <= 6 {
                    push_unique(&mut materials, item.to_string());
                }
            }
        }

        materials
    }

    fn percentages(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut found = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let token = token.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | ')'));
            let has_digit = token.chars().any(|c| c.is_ascii_digit());
            if !has_digit {
                continue;
            }
            if token.ends_with('%') {
                push_unique(&mut found, token.trim_start_matches('(').to_string());
                continue;
            }
            let numeric = token.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.');
            if !numeric {
                continue;
            }
            let next = tokens.get(i + 1).map(|t| normalize_token(t));
            if tokens.get(i + 1).map_or(false, |t| t.starts_with('%')) {
                push_unique(&mut found, format!("{}%", token));
            } else if next.as_deref() == Some("por")
                && tokens.get(i + 2).map(|t| normalize_token(t)).as_deref() == Some("ciento")
            {
                push_unique(&mut found, format!("{}%", token));
            }
        }

        found
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !item.is_empty() && !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imperative_sentences() {
        let analyzer = LexicalAnalyzer::new();
        let text = "Riega la planta. Corta las hojas. Abona el suelo. Observa resultados.";
        assert_eq!(analyzer.imperative_verb_count(text), 4);
    }

    #[test]
    fn test_descriptive_text_has_no_imperatives() {
        let analyzer = LexicalAnalyzer::new();
        let text = "El suelo contiene minerales. Los nutrientes son esenciales para el crecimiento. \
                    La siembra de otoño depende del clima.";
        assert_eq!(analyzer.imperative_verb_count(text), 0);
    }

    #[test]
    fn test_known_imperative_mid_sentence() {
        let analyzer = LexicalAnalyzer::new();
        assert_eq!(analyzer.imperative_verb_count("Después de la lluvia, riega con moderación."), 1);
        assert_eq!(analyzer.imperative_verb_count("Llegó la poda de invierno."), 0);
    }

    #[test]
    fn test_sentences_keep_decimals() {
        let analyzer = LexicalAnalyzer::new();
        let sentences = analyzer.sentences("Usa 2.5 litros de agua. ¿Funciona?\nSí!");
        assert_eq!(sentences, vec!["Usa 2.5 litros de agua", "¿Funciona", "Sí"]);
    }

    #[test]
    fn test_starts_with_imperative() {
        let analyzer = LexicalAnalyzer::new();
        assert!(analyzer.starts_with_imperative("1 Coloca las semillas"));
        assert!(!analyzer.starts_with_imperative("Las semillas germinan"));
    }

    #[test]
    fn test_key_concepts() {
        let analyzer = LexicalAnalyzer::new();
        let text = "El proyecto de la Fundación Huerta Viva usa compost. Trabajamos con el INTA, y con Monsanto.";
        let concepts = analyzer.key_concepts(text, 5);
        assert_eq!(concepts, vec!["Fundación Huerta Viva", "INTA", "Monsanto"]);
        assert_eq!(analyzer.key_concepts(text, 1).len(), 1);
    }

    #[test]
    fn test_materials() {
        let analyzer = LexicalAnalyzer::new();
        let text = "Para empezar necesitarás: una maceta, tierra negra y semillas de tomate. Luego riega.";
        assert_eq!(
            analyzer.materials(text),
            vec!["una maceta", "tierra negra", "semillas de tomate"]
        );
        assert!(analyzer.materials("Sin lista aquí.").is_empty());
    }

    #[test]
    fn test_percentages() {
        let analyzer = LexicalAnalyzer::new();
        let text = "La cosecha aumentó un 35% y el consumo de agua bajó 20 por ciento (12,5%).";
        assert_eq!(analyzer.percentages(text), vec!["35%", "20%", "12,5%"]);
    }
}
