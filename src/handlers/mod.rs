mod checkout;
mod webhook;

pub use checkout::*;
pub use webhook::*;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::db::AppState;
use crate::error::Result;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Provider-connectivity check: verifies the configured Stripe key actually
/// works before any real purchase depends on it.
async fn stripe_health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    state.stripe.ping().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// JSON 404 for unmatched routes.
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/stripe", get(stripe_health))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/webhook/stripe", post(handle_stripe_webhook))
        .fallback(not_found)
}
