use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bb_core::Result;
use rand::Rng;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use url::Url;

pub const RENDER_URL_ENV: &str = "BB_RENDER_URL";
pub const RENDER_TOKEN_ENV: &str = "BB_RENDER_TOKEN";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ALTERNATE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
    (KHTML, like Gecko) Version/16.5 Safari/605.1.15";

/// A fetched page body with the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

/// Anything that can turn a URL into page HTML. `None` means the page is
/// unusable: unreachable, an error status, or too short.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<Page>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub min_body_chars: usize,
    /// Attempts per strategy for transient failures.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub delay_min: Duration,
    pub delay_max: Duration,
    pub user_agent: String,
    /// Second plain attempt with this agent. `None` skips the step.
    pub alternate_user_agent: Option<String>,
    /// Headless rendering service (`/content` API). `None` skips the step.
    pub render_url: Option<String>,
    pub render_token: Option<String>,
    /// A page with no match for this selector is retried rendered.
    pub render_probe: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            min_body_chars: 2000,
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            delay_min: Duration::from_millis(1500),
            delay_max: Duration::from_millis(4000),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            alternate_user_agent: Some(ALTERNATE_USER_AGENT.to_string()),
            render_url: None,
            render_token: None,
            render_probe: Some("article".to_string()),
        }
    }
}

#[derive(Debug)]
enum Failure {
    /// Worth retrying: connection problems, timeouts, 429 and 5xx.
    Transient(String),
    Permanent(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Transient(msg) => write!(f, "transient: {}", msg),
            Failure::Permanent(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy<'a> {
    Plain(&'a str),
    Rendered(&'a str),
}

/// HTTP page source with escalation: plain fetch, then a second user agent,
/// then a JavaScript-rendered fetch. Requests are never concurrent and are
/// spaced by a random politeness delay.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
    probe: Option<Selector>,
    started: AtomicBool,
    gate: tokio::sync::Mutex<()>,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("client", &"<reqwest::Client>")
            .field("timeout", &self.config.timeout)
            .field("render_url", &self.config.render_url)
            .field("render_token", &self.config.render_token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(3))
            .build()?;
        let probe = config.render_probe.as_deref().and_then(|p| Selector::parse(p).ok());
        Ok(Self {
            client,
            config,
            probe,
            started: AtomicBool::new(false),
            gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn politeness_delay(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let (min, max) = (self.config.delay_min, self.config.delay_max);
        let delay = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        if !delay.is_zero() {
            tracing::debug!("⏳ Waiting {:.1}s before next request", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }

    fn strategies(&self) -> Vec<Strategy<'_>> {
        let mut strategies = vec![Strategy::Plain(&self.config.user_agent)];
        if let Some(agent) = &self.config.alternate_user_agent {
            strategies.push(Strategy::Plain(agent));
        }
        if let Some(render_url) = &self.config.render_url {
            strategies.push(Strategy::Rendered(render_url));
        }
        strategies
    }

    async fn attempt(&self, strategy: Strategy<'_>, url: &str) -> std::result::Result<Page, Failure> {
        let response = match strategy {
            Strategy::Plain(agent) => self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, agent)
                .header(reqwest::header::ACCEPT_LANGUAGE, "es-ES,es;q=0.9")
                .send()
                .await,
            Strategy::Rendered(base) => {
                let endpoint = render_endpoint(base, self.config.render_token.as_deref())
                    .map_err(|e| Failure::Permanent(format!("bad render URL {}: {}", base, e)))?;
                self.client
                    .post(endpoint)
                    .json(&serde_json::json!({ "url": url }))
                    .send()
                    .await
            }
        };

        let response = response.map_err(|e| Failure::Transient(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let msg = format!("HTTP {}", status);
            return Err(if is_transient(status) {
                Failure::Transient(msg)
            } else {
                Failure::Permanent(msg)
            });
        }

        let final_url = match strategy {
            Strategy::Plain(_) => response.url().clone(),
            Strategy::Rendered(_) => Url::parse(url).map_err(|e| Failure::Permanent(e.to_string()))?,
        };
        let html = response.text().await.map_err(|e| Failure::Transient(e.to_string()))?;

        let chars = html.chars().count();
        if chars < self.config.min_body_chars {
            return Err(Failure::Permanent(format!("insufficient content ({} chars)", chars)));
        }
        Ok(Page { url: final_url, html })
    }

    /// Runs one strategy with exponential backoff on transient failures.
    async fn attempt_with_retry(&self, strategy: Strategy<'_>, url: &str) -> std::result::Result<Page, Failure> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.attempt(strategy, url).await {
                Ok(page) => return Ok(page),
                Err(Failure::Transient(msg)) if attempt < attempts => {
                    let backoff = self.config.backoff_base * 2u32.pow(attempt - 1);
                    tracing::debug!("🔁 Retry {}/{} for {} in {:?}: {}", attempt, attempts - 1, url, backoff, msg);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn lacks_probe_match(&self, html: &str) -> bool {
        match &self.probe {
            Some(probe) => Html::parse_document(html).select(probe).next().is_none(),
            None => false,
        }
    }
}

/// `<base>/content`, with the token as an encoded query parameter.
fn render_endpoint(base: &str, token: Option<&str>) -> std::result::Result<Url, url::ParseError> {
    let mut endpoint = Url::parse(&format!("{}/content", base.trim_end_matches('/')))?;
    if let Some(token) = token {
        endpoint.query_pairs_mut().append_pair("token", token);
    }
    Ok(endpoint)
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<Page> {
        let _gate = self.gate.lock().await;
        self.politeness_delay().await;

        let mut fallback: Option<Page> = None;
        for strategy in self.strategies() {
            match strategy {
                // A page already fetched plain only needs rendering now.
                Strategy::Plain(_) if fallback.is_some() => continue,
                Strategy::Rendered(_) => tracing::info!("🖥️ Trying rendered fetch for {}", url),
                Strategy::Plain(_) => {}
            }
            match self.attempt_with_retry(strategy, url).await {
                Ok(page) => {
                    let rendered_next = self.config.render_url.is_some()
                        && matches!(strategy, Strategy::Plain(_))
                        && self.lacks_probe_match(&page.html);
                    if !rendered_next {
                        return Some(page);
                    }
                    // Usable, but try rendering first; keep this as a fallback.
                    fallback.get_or_insert(page);
                }
                Err(e) => tracing::debug!("Fetch of {} failed: {}", url, e),
            }
        }

        if fallback.is_none() {
            tracing::warn!("⚠️ Could not fetch {}", url);
        }
        fallback
    }
}
