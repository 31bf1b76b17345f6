use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use sentiment_proxy::{AppState, GeminiProvider, ModelProvider, ProxyConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ProxyConfig::from_env();
    let bind_addr = config.bind_addr();

    let provider: Option<Arc<dyn ModelProvider>> = match config.api_key.as_deref() {
        Some(api_key) => match GeminiProvider::new(api_key, &config.model, &config.base_url) {
            Ok(provider) => {
                tracing::info!("Using model {}", config.model);
                Some(Arc::new(provider) as Arc<dyn ModelProvider>)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create model client, requests will be refused");
                None
            }
        },
        None => {
            tracing::warn!("GEMINI_API_KEY is not set, every request will be refused");
            None
        }
    };

    let state = web::Data::new(AppState { provider });

    tracing::info!("Starting sentiment proxy on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(sentiment_proxy::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
