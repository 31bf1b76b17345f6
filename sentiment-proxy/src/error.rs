//! Error responses for the proxy endpoint.
//!
//! Callers only ever see `{"error": "..."}` with status 500; the detailed
//! cause goes to the log.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use interfaces::wire::ErrorBody;

pub const MISSING_API_KEY_MESSAGE: &str = "API key not found in environment.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred inside the function.";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("model API key is not configured")]
    MissingApiKey,

    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("model provider failed: {0}")]
    Provider(String),

    #[error("model returned no text")]
    EmptyResponse,
}

impl ProxyError {
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::MissingApiKey => MISSING_API_KEY_MESSAGE,
            _ => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!(message = %self, "Error during function execution");

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.public_message().to_string(),
        })
    }
}
