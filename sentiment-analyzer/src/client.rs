use crate::types::{AnalyzerError, ClientConfig, ProxyRequest, Result};
use interfaces::wire::ErrorBody;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// HTTP client for the analysis proxy. Returns the raw model text.
pub struct ProxyClient {
    client: Client,
    endpoint: Url,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(AnalyzerError::Config(format!(
                "proxy URL must use http or https: {}",
                config.endpoint
            )));
        }

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .brotli(true);
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn send(&self, request: &ProxyRequest) -> Result<String> {
        let start_time = Instant::now();
        debug!("Sending {} request to {}", request.kind(), self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").to_string());
            warn!(
                "Proxy returned HTTP {} for {} request after {}ms: {}",
                status.as_u16(),
                request.kind(),
                elapsed_ms,
                message
            );
            return Err(AnalyzerError::Transport {
                status: status.as_u16(),
                message,
            });
        }

        info!(
            "Received {} response ({} bytes) in {}ms",
            request.kind(),
            body.len(),
            elapsed_ms
        );
        Ok(body)
    }
}
