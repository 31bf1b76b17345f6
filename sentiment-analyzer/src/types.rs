use serde::{Deserialize, Serialize};

pub use interfaces::defs::{AnalysisResult, Post, Sentiment};
pub use interfaces::wire::{ProxyRequest, ReportData, StrategicInsights};

pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8888/api/analyze";
pub const DEFAULT_BATCH_SIZE: usize = 25;
pub const DEFAULT_MAX_POSTS: usize = 500;

/// HTTP settings for talking to the proxy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// `None` leaves the HTTP client's defaults in place.
    pub timeout_seconds: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROXY_URL.to_string(),
            user_agent: "Sentiment-Analyzer/1.0".to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// One request per batch of posts.
    Batched,
    /// One request per post, retried before falling back to a `Failed` result.
    PerPost,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub batch_size: usize,
    pub max_posts: usize,
    pub mode: AnalysisMode,
    pub retry: RetryConfig,
    /// Ask the model for a written report once all batches are in.
    pub request_model_insights: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_posts: DEFAULT_MAX_POSTS,
            mode: AnalysisMode::Batched,
            retry: RetryConfig::default(),
            request_model_insights: false,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(AnalyzerError::Config("batch size must be at least 1".to_string()));
        }
        if self.max_posts == 0 {
            return Err(AnalyzerError::Config("post limit must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(AnalyzerError::Config("at least one attempt is required".to_string()));
        }
        Ok(())
    }
}

/// Failure to recover a usable payload from model text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON object found in model response")]
    NoJsonObject,

    #[error("model response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("model response is missing the expected '{0}' data")]
    MissingField(&'static str),

    #[error("model returned {actual} results for {expected} posts")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded with status {status}: {message}")]
    Transport { status: u16, message: String },

    #[error("Parse error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Please paste or upload some text to analyze.")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
