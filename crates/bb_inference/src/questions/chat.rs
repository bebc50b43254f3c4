use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bb_core::{Error, QuestionGenerator, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Asks an OpenAI-compatible chat completion endpoint for a quiz question.
pub struct ChatQuestions {
    client: Arc<Client>,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl ChatQuestions {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn prompt(topic: &str) -> String {
        format!(
            "Write one short review question, in Spanish, for a book chapter about: {}.\n\
             Answer with the question only.",
            topic
        )
    }
}

impl fmt::Debug for ChatQuestions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatQuestions")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl QuestionGenerator for ChatQuestions {
    fn name(&self) -> &str {
        "chat"
    }

    async fn generate_question(&self, topic: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::prompt(topic),
            }],
            temperature: 0.7,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let question = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if question.is_empty() {
            return Err(Error::Inference("Empty question from chat endpoint".to_string()));
        }
        tracing::debug!("Generated question for {}: {}", topic, question);
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single canned HTTP response after reading the full request.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_question_from_endpoint() {
        let url = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"  ¿Cómo se riega por goteo?  "}}]}"#,
        )
        .await;
        let generator = ChatQuestions::new(url, Some("key".to_string()), "test-model").unwrap();
        assert_eq!(
            generator.generate_question("riego").await.unwrap(),
            "¿Cómo se riega por goteo?"
        );
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let url = serve_once("500 Internal Server Error", "{}").await;
        let generator = ChatQuestions::new(url, None, "test-model").unwrap();
        assert!(generator.generate_question("riego").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let url = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let generator = ChatQuestions::new(url, None, "test-model").unwrap();
        assert!(matches!(
            generator.generate_question("riego").await,
            Err(Error::Inference(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let generator = ChatQuestions::new("http://localhost", Some("secret".to_string()), "m").unwrap();
        let debug = format!("{:?}", generator);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
