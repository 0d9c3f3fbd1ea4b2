use axum::{extract::State, http::header::ORIGIN, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PUBLIC_URL;
use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::models::{ANONYMOUS_USERNAME, GUEST_USER_ID};
use crate::payments::SessionMetadata;

/// Purchase request. Both fields are optional - an anonymous purchase is
/// legal, it just produces no entitlement later.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl CheckoutRequest {
    /// Resolve the metadata embedded in the session. Absent or blank
    /// identity fields are replaced with sentinels here, before anything is
    /// sent to Stripe, so the provider and the webhook handler never see
    /// empty values.
    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            user_id: non_blank(self.user_id.as_deref(), GUEST_USER_ID),
            username: non_blank(self.username.as_deref(), ANONYMOUS_USERNAME),
        }
    }
}

fn non_blank(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Base origin for redirect targets: caller's Origin header first, then the
/// configured public URL, then the hardcoded default. Stripe performs the
/// redirect after payment, outside this request cycle.
pub fn resolve_origin(headers: &HeaderMap, public_url: Option<&str>) -> String {
    headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .or_else(|| public_url.map(|v| v.to_string()))
        .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string())
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Session Initiator: build a provider-hosted checkout session for the
/// premium pass and hand back its opaque id. No local state is written -
/// the session lives entirely in Stripe until the completion webhook.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let metadata = request.metadata();
    let origin = resolve_origin(&headers, state.public_url.as_deref());

    // {CHECKOUT_SESSION_ID} is substituted by Stripe, not by us.
    let success_url = format!("{}/success.html?session_id={{CHECKOUT_SESSION_ID}}", origin);
    let cancel_url = format!("{}/polepass.html", origin);

    let session_id = state
        .stripe
        .create_checkout_session(&metadata, &success_url, &cancel_url)
        .await?;

    tracing::info!(
        "Checkout session created: session={}, user_id={}",
        session_id,
        metadata.user_id
    );

    Ok(Json(CheckoutResponse { session_id }))
}
