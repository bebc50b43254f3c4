use async_trait::async_trait;
use bb_core::{QuestionGenerator, Result};

pub const DEFAULT_QUESTION_TEMPLATE: &str = "What have you learned about {topic}?";

/// Fills `{topic}` into a fixed template. Never fails.
#[derive(Debug, Clone)]
pub struct TemplateQuestions {
    template: String,
}

impl TemplateQuestions {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, topic: &str) -> String {
        self.template.replace("{topic}", topic)
    }
}

impl Default for TemplateQuestions {
    fn default() -> Self {
        Self::new(DEFAULT_QUESTION_TEMPLATE)
    }
}

#[async_trait]
impl QuestionGenerator for TemplateQuestions {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate_question(&self, topic: &str) -> Result<String> {
        Ok(self.render(topic))
    }
}
