use crate::client::ProxyClient;
use crate::types::{AnalyzerError, Post, ProxyRequest, ReportData, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::debug;

/// Something that can turn posts into raw model text.
///
/// Implementations return the text as produced by the model; extraction and
/// validation happen in the orchestrator.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    fn backend_name(&self) -> String;

    /// Classify a whole batch in one request.
    async fn analyze_batch(&self, posts: &[Post]) -> Result<String>;

    /// Classify a single post.
    async fn analyze_post(&self, post: &Post) -> Result<String>;

    /// Write strategic insights from aggregate figures.
    async fn generate_report(&self, report: &ReportData) -> Result<String>;
}

#[async_trait]
impl AnalysisBackend for ProxyClient {
    fn backend_name(&self) -> String {
        format!("Proxy ({})", self.endpoint())
    }

    async fn analyze_batch(&self, posts: &[Post]) -> Result<String> {
        self.send(&ProxyRequest::batch(posts)).await
    }

    async fn analyze_post(&self, post: &Post) -> Result<String> {
        self.send(&ProxyRequest::analyze_post(post)).await
    }

    async fn generate_report(&self, report: &ReportData) -> Result<String> {
        self.send(&ProxyRequest::generate_report(report.clone())).await
    }
}

/// Scripted reply for [`MockBackend`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Transport { status: u16, message: String },
}

/// Backend for development and testing.
///
/// Scripted replies are consumed in order; once they run out the mock answers
/// like a well-behaved model, using a keyword heuristic and a fenced JSON
/// block.
pub struct MockBackend {
    name: String,
    response_delay_ms: u64,
    script: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<ProxyRequest>>,
}

impl MockBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response_delay_ms: 0,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    pub fn with_replies(mut self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.script.get_mut().extend(replies);
        self
    }

    /// Every request received so far, in order.
    pub async fn calls(&self) -> Vec<ProxyRequest> {
        self.calls.lock().await.clone()
    }

    async fn respond(&self, request: ProxyRequest, fallback: impl FnOnce() -> String) -> Result<String> {
        if self.response_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.response_delay_ms)).await;
        }
        debug!("Mock backend '{}' handling {} request", self.name, request.kind());
        self.calls.lock().await.push(request);

        match self.script.lock().await.pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Transport { status, message }) => {
                Err(AnalyzerError::Transport { status, message })
            }
            None => Ok(fallback()),
        }
    }
}

/// Crude keyword labelling so mock output looks plausible.
pub fn keyword_sentiment(text: &str) -> (&'static str, &'static str) {
    const POSITIVE: [&str; 8] = ["great", "love", "excellent", "good", "amazing", "happy", "awesome", "best"];
    const NEGATIVE: [&str; 8] = ["terrible", "bad", "awful", "hate", "poor", "worst", "broken", "angry"];

    let lower = text.to_lowercase();
    let positive = POSITIVE.iter().any(|w| lower.contains(w));
    let negative = NEGATIVE.iter().any(|w| lower.contains(w));

    match (positive, negative) {
        (true, true) => ("Mixed", "The post contains both praise and complaints."),
        (true, false) => ("Positive", "The post uses approving language."),
        (false, true) => ("Negative", "The post uses critical language."),
        (false, false) => ("Neutral", "The post does not express a clear opinion."),
    }
}

fn fenced(value: serde_json::Value) -> String {
    format!("```json\n{}\n```", value)
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    fn backend_name(&self) -> String {
        format!("Mock backend ({})", self.name)
    }

    async fn analyze_batch(&self, posts: &[Post]) -> Result<String> {
        let posts_owned = posts.to_vec();
        self.respond(ProxyRequest::batch(posts), move || {
            let analysis: Vec<_> = posts_owned
                .iter()
                .map(|post| {
                    let (sentiment, justification) = keyword_sentiment(post.as_str());
                    json!({
                        "text": post.as_str(),
                        "sentiment": sentiment,
                        "justification": justification,
                    })
                })
                .collect();
            fenced(json!({ "post_analysis": analysis }))
        })
        .await
    }

    async fn analyze_post(&self, post: &Post) -> Result<String> {
        let (sentiment, justification) = keyword_sentiment(post.as_str());
        self.respond(ProxyRequest::analyze_post(post), move || {
            fenced(json!({ "sentiment": sentiment, "justification": justification }))
        })
        .await
    }

    async fn generate_report(&self, report: &ReportData) -> Result<String> {
        let analyzed = report.analyzed_posts;
        self.respond(ProxyRequest::generate_report(report.clone()), move || {
            fenced(json!({
                "summary": format!("What these results mean... {} posts were analyzed.", analyzed),
                "insights_list": [
                    "Amplify the themes behind positive posts.",
                    "Respond to the most common complaints.",
                    "Repeat the analysis to track shifts in opinion.",
                ],
            }))
        })
        .await
    }
}
