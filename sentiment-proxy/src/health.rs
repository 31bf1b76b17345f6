use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

use crate::handler::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub provider: String,
}

/// Liveness probe. Reports whether a model provider is configured but always
/// answers 200 while the process is up.
#[get("/health/live")]
pub async fn liveness(state: web::Data<AppState>) -> impl Responder {
    let provider = match &state.provider {
        Some(provider) => provider.provider_name(),
        None => "unconfigured".to_string(),
    };

    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(liveness);
}
