pub mod config;
pub mod error;
pub mod handler;
pub mod health;
pub mod prompts;
pub mod provider;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use handler::AppState;
pub use provider::{GeminiProvider, ModelProvider, ProviderError};

use actix_web::web;

/// Register every route of the proxy.
pub fn configure(cfg: &mut web::ServiceConfig) {
    handler::configure(cfg);
    health::configure(cfg);
}
