use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{QuestionGenerator, Result};

pub mod chat;
pub mod template;

pub use chat::ChatQuestions;
pub use template::{TemplateQuestions, DEFAULT_QUESTION_TEMPLATE};

pub const QUESTION_API_URL_ENV: &str = "BB_QUESTION_API_URL";
pub const QUESTION_API_KEY_ENV: &str = "BB_QUESTION_API_KEY";
pub const QUESTION_MODEL_ENV: &str = "BB_QUESTION_MODEL";

#[derive(Debug, Clone)]
pub struct QuestionConfig {
    /// Chat completion base URL. Without it only the template is used.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub template: String,
}

impl Default for QuestionConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: "deepseek-chat".to_string(),
            template: DEFAULT_QUESTION_TEMPLATE.to_string(),
        }
    }
}

impl QuestionConfig {
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_url: non_empty(QUESTION_API_URL_ENV),
            api_key: non_empty(QUESTION_API_KEY_ENV),
            model: non_empty(QUESTION_MODEL_ENV).unwrap_or(defaults.model),
            template: defaults.template,
        }
    }
}

/// Tries the primary generator and answers from the template when it
/// fails, so a question is always produced.
pub struct FallbackQuestions {
    primary: Arc<dyn QuestionGenerator>,
    fallback: TemplateQuestions,
}

impl FallbackQuestions {
    pub fn new(primary: Arc<dyn QuestionGenerator>, fallback: TemplateQuestions) -> Self {
        Self { primary, fallback }
    }
}

impl fmt::Debug for FallbackQuestions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackQuestions")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback)
            .finish()
    }
}

#[async_trait]
impl QuestionGenerator for FallbackQuestions {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn generate_question(&self, topic: &str) -> Result<String> {
        match self.primary.generate_question(topic).await {
            Ok(question) => Ok(question),
            Err(e) => {
                tracing::warn!("⚠️ {} question generator failed, using template: {}", self.primary.name(), e);
                Ok(self.fallback.render(topic))
            }
        }
    }
}

/// Builds the question generator for a config. A configured chat endpoint
/// is always wrapped with the template fallback.
pub fn create_generator(config: &QuestionConfig) -> Result<Arc<dyn QuestionGenerator>> {
    let template = TemplateQuestions::new(config.template.clone());
    match &config.api_url {
        Some(url) => {
            tracing::info!("🤖 Using chat question generator at {}", url);
            let chat = ChatQuestions::new(url.clone(), config.api_key.clone(), config.model.clone())?;
            Ok(Arc::new(FallbackQuestions::new(Arc::new(chat), template)))
        }
        None => Ok(Arc::new(template)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::Error;

    #[derive(Debug)]
    struct BrokenGenerator;

    #[async_trait]
    impl QuestionGenerator for BrokenGenerator {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate_question(&self, _topic: &str) -> Result<String> {
            Err(Error::Inference("model not loaded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fallback_on_failure() {
        let generator = FallbackQuestions::new(Arc::new(BrokenGenerator), TemplateQuestions::default());
        assert_eq!(
            generator.generate_question("compost").await.unwrap(),
            "What have you learned about compost?"
        );
    }

    #[tokio::test]
    async fn test_template_without_endpoint() {
        let generator = create_generator(&QuestionConfig::default()).unwrap();
        assert_eq!(generator.name(), "template");
        assert_eq!(
            generator.generate_question("suelo").await.unwrap(),
            "What have you learned about suelo?"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let config = QuestionConfig {
            api_url: Some("http://127.0.0.1:9".to_string()),
            ..QuestionConfig::default()
        };
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.name(), "chat");
        assert_eq!(
            generator.generate_question("poda").await.unwrap(),
            "What have you learned about poda?"
        );
    }
}
