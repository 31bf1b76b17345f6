use crate::error::ProxyError;
use crate::prompts::build_prompt;
use crate::provider::ModelProvider;
use actix_web::{web, HttpResponse};
use interfaces::wire::{BatchRequest, ProxyRequest, TaskRequest};
use std::sync::Arc;
use tracing::{debug, info};

pub const ANALYZE_PATH: &str = "/api/analyze";
pub const LEGACY_ANALYZE_PATH: &str = "/.netlify/functions/gemini-proxy";
/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Shared state for the handlers. `provider` is `None` when no API key was
/// configured, which fails every request.
pub struct AppState {
    pub provider: Option<Arc<dyn ModelProvider>>,
}

fn validate(request: &ProxyRequest) -> Result<(), ProxyError> {
    let empty = match request {
        ProxyRequest::Batch(BatchRequest { posts, .. }) => posts.is_empty(),
        ProxyRequest::Task(TaskRequest::AnalyzePost { post })
        | ProxyRequest::Task(TaskRequest::ExplainSentiment { post, .. }) => {
            post.as_str().trim().is_empty()
        }
        ProxyRequest::Task(TaskRequest::GenerateReport { .. }) => false,
    };
    if empty {
        return Err(ProxyError::BadRequest(format!(
            "{} request has no post content",
            request.kind()
        )));
    }
    Ok(())
}

/// Inject the prompt template for the request and return the model's raw text.
pub async fn analyze(
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ProxyError> {
    let provider = state.provider.as_ref().ok_or(ProxyError::MissingApiKey)?;

    let body = payload
        .to_bytes_limited(MAX_BODY_BYTES)
        .await
        .map_err(|_| {
            ProxyError::BadRequest(format!("request body exceeds {} bytes", MAX_BODY_BYTES))
        })?
        .map_err(|e| ProxyError::BadRequest(e.to_string()))?;

    let request: ProxyRequest =
        serde_json::from_slice(&body).map_err(|e| ProxyError::BadRequest(e.to_string()))?;
    validate(&request)?;

    let prompt = build_prompt(&request);
    debug!("Built {} prompt ({} chars)", request.kind(), prompt.len());

    let text = provider
        .generate(&prompt)
        .await
        .map_err(|e| ProxyError::Provider(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(ProxyError::EmptyResponse);
    }

    info!(
        "Answered {} request via {} ({} chars)",
        request.kind(),
        provider.provider_name(),
        text.len()
    );
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(ANALYZE_PATH, web::post().to(analyze))
        .route(LEGACY_ANALYZE_PATH, web::post().to(analyze));
}
