//! Spanish word lists used by the lexical heuristics.

use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    /// Words dropped before TF-IDF vectorization and never taken as
    /// imperatives or concepts.
    pub static ref STOPWORDS: HashSet<&'static str> = [
        "a", "al", "algo", "algunas", "algunos", "ante", "antes", "aquel", "aquella", "aquellas",
        "aquellos", "aqui", "aquí", "asi", "así", "aun", "aunque", "bajo", "bien", "cada", "casi",
        "como", "cómo", "con", "contra", "cual", "cuál", "cuales", "cuando", "cuándo", "cuanto",
        "de", "del", "desde", "donde", "dónde", "durante", "e", "el", "él", "ella", "ellas", "ellos",
        "en", "entre", "era", "eran", "es", "esa", "esas", "ese", "eso", "esos", "esta", "está",
        "estaba", "estaban", "estamos", "estan", "están", "estar", "estas", "este", "esto", "estos",
        "fue", "fueron", "ha", "hace", "hacia", "han", "hasta", "hay", "incluso", "la", "las", "le",
        "les", "lo", "los", "mas", "más", "me", "mi", "mientras", "mis", "mucha", "muchas", "mucho",
        "muchos", "muy", "nada", "ni", "ningun", "ninguna", "ninguno", "no", "nos", "nosotros",
        "nuestra", "nuestras", "nuestro", "nuestros", "nunca", "o", "otra", "otras", "otro", "otros",
        "para", "pero", "poca", "pocas", "poco", "pocos", "por", "porque", "que", "qué", "quien",
        "quién", "quienes", "se", "sea", "segun", "según", "ser", "si", "sí", "siempre", "sin",
        "sino", "sobre", "son", "su", "sus", "tal", "tambien", "también", "tampoco", "tan", "tanto",
        "te", "tiene", "tienen", "toda", "todas", "todo", "todos", "tras", "tu", "tú", "tus", "u",
        "un", "una", "unas", "uno", "unos", "usted", "ustedes", "ya", "yo", "luego", "ahora",
        "despues", "después", "entonces", "ademas", "además", "apenas", "otra", "misma", "mismo",
        "puede", "pueden", "ser", "sido", "son", "vez", "veces", "cuanta", "cuantas", "dicha",
        "dicho", "ante", "ambas", "ambos", "cerca", "lejos", "dentro", "fuera", "encima", "debajo",
    ]
    .into_iter()
    .collect();

    /// Words that turn a following verb-looking token into a noun
    /// ("la siembra", "una poda").
    pub static ref DETERMINERS: HashSet<&'static str> = [
        "el", "la", "los", "las", "un", "una", "unos", "unas", "su", "sus", "mi", "mis", "tu", "tus",
        "este", "esta", "estos", "estas", "ese", "esa", "esos", "esas", "del", "al", "de", "cada",
        "nuestra", "nuestro", "nuestras", "nuestros", "primera", "primer", "buena", "buen", "mala",
    ]
    .into_iter()
    .collect();

    /// Frequent imperative forms (tú and usted) in how-to writing.
    pub static ref IMPERATIVES: HashSet<&'static str> = [
        "abona", "abone", "abre", "abra", "agrega", "agregue", "añade", "añada", "ajusta", "ajuste",
        "anota", "anote", "aplica", "aplique", "asegúrate", "asegúrese", "busca", "busque",
        "calcula", "calcule", "cava", "cave", "cierra", "cierre", "coloca", "coloque", "compra",
        "compre", "comprueba", "compruebe", "conecta", "conecte", "controla", "controle",
        "corta", "corte", "cubre", "cubra", "deja", "deje", "elige", "elija", "escoge", "escoja",
        "espera", "espere", "evita", "evite", "guarda", "guarde", "haz", "haga", "humedece",
        "humedezca", "instala", "instale", "lava", "lave", "limpia", "limpie", "llena", "llene",
        "mantén", "mantenga", "marca", "marque", "mezcla", "mezcle", "mide", "mida", "observa",
        "observe", "pon", "ponga", "poda", "pode", "prepara", "prepare", "protege", "proteja",
        "recuerda", "recuerde", "remueve", "remueva", "retira", "retire", "revisa", "revise",
        "riega", "riegue", "rocía", "rocíe", "seca", "seque", "selecciona", "seleccione", "siembra",
        "siembre", "sigue", "siga", "toma", "tome", "trasplanta", "trasplante", "usa", "use",
        "utiliza", "utilice", "verifica", "verifique", "fertiliza", "fertilice", "cosecha",
        "coseche", "ven", "venga", "ten", "tenga", "sal", "salga", "di", "diga", "echa", "eche",
        "saca", "saque", "enciende", "encienda", "apaga", "apague", "rellena", "rellene", "pinta",
        "pinte", "entierra", "entierre", "sujeta", "sujete", "tapa", "tape", "vierte", "vierta",
    ]
    .into_iter()
    .collect();

    /// Object pronouns that attach to the end of an imperative ("colócala").
    pub static ref ENCLITICS: Vec<&'static str> = vec![
        "melo", "mela", "selo", "sela", "los", "las", "les", "nos", "lo", "la", "le", "se", "te", "me",
    ];

    /// Words that introduce a list of required materials.
    pub static ref MATERIAL_CUES: Vec<&'static str> = vec![
        "materiales", "necesitarás", "necesitaras", "necesitas", "necesitamos", "necesitaremos",
        "herramientas", "ingredientes", "hace falta",
    ];
}

/// Default phrases that mark an article as a case study.
pub const CASE_STUDY_PHRASES: &[&str] = &["caso real", "ejemplo práctico", "implementación"];

/// Lowercases and trims leading/trailing punctuation from a token.
pub fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

fn has_accent(word: &str) -> bool {
    word.chars().any(|c| matches!(c, 'á' | 'é' | 'í' | 'ó' | 'ú'))
}

fn strip_accents(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect()
}

/// Sentence-opening imperative: a known form, or a known form carrying an
/// enclitic pronoun and the accent it forces ("colócala" from "coloca").
pub fn looks_imperative(word: &str) -> bool {
    if word.chars().count() < 4 || is_stopword(word) || DETERMINERS.contains(word) {
        return false;
    }
    if !word.chars().all(char::is_alphabetic) {
        return false;
    }
    if IMPERATIVES.contains(word) {
        return true;
    }
    has_accent(word)
        && ENCLITICS.iter().any(|pronoun| {
            word.strip_suffix(pronoun)
                .map_or(false, |stem| IMPERATIVES.contains(strip_accents(stem).as_str()))
        })
}
