//! Confirmation Handler: verifies Stripe's signed completion webhooks and
//! applies the premium entitlement.
//!
//! The signature is checked over the raw body before any field of the
//! payload is parsed - acting on an unverified body would make entitlement
//! grants forgeable.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::AppError;
use crate::models::GUEST_USER_ID;
use crate::payments::{StripeCheckoutSession, StripeWebhookEvent};

/// Result type for webhook failure responses.
pub type WebhookResult = (StatusCode, &'static str);

/// Acknowledgment body returned for every handled outcome. Stripe stops
/// redelivering once it sees a 2xx, so everything that is not a verification
/// failure converges here.
#[derive(Serialize)]
struct WebhookAck {
    received: bool,
}

/// Verified webhook payload, dispatched as a closed variant. Event kinds
/// this service does not act on land in the explicit `Ignored` arm rather
/// than falling through a string match.
#[derive(Debug)]
pub enum WebhookEvent {
    CheckoutCompleted(StripeCheckoutSession),
    Ignored { event_type: String },
}

fn extract_signature(headers: &HeaderMap) -> Result<String, WebhookResult> {
    headers
        .get("stripe-signature")
        .ok_or((StatusCode::BAD_REQUEST, "Missing stripe-signature header"))?
        .to_str()
        .map(|s| s.to_string())
        .map_err(|e| {
            tracing::debug!("Invalid UTF-8 in Stripe signature header: {}", e);
            (StatusCode::BAD_REQUEST, "Invalid signature header")
        })
}

/// Parse a verified body into a [`WebhookEvent`]. Only called after the
/// signature has been accepted.
pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, WebhookResult> {
    let event: StripeWebhookEvent = serde_json::from_slice(body).map_err(|e| {
        tracing::error!("Failed to parse Stripe webhook: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid JSON")
    })?;

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: StripeCheckoutSession = serde_json::from_value(event.data.object)
                .map_err(|e| {
                    tracing::error!("Failed to parse checkout session: {}", e);
                    (StatusCode::BAD_REQUEST, "Invalid checkout session")
                })?;
            Ok(WebhookEvent::CheckoutCompleted(session))
        }
        _ => Ok(WebhookEvent::Ignored {
            event_type: event.event_type,
        }),
    }
}

/// Apply the entitlement for a completed checkout.
///
/// The mutation is a constant assignment (`premium = 1`), so at-least-once
/// delivery needs no dedup state: replays are no-ops.
pub fn apply_entitlement(
    state: &AppState,
    session: &StripeCheckoutSession,
) -> Result<(), WebhookResult> {
    let user_id = session.metadata.user_id.as_deref().unwrap_or(GUEST_USER_ID);

    // Anonymous purchases have no entitlement target. Acknowledge anyway -
    // failing here would make Stripe redeliver an event we will never act on.
    if user_id == GUEST_USER_ID || user_id.trim().is_empty() {
        tracing::info!(
            "Checkout completed for guest session {} - no entitlement to apply",
            session.id
        );
        return Ok(());
    }

    let outcome = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| queries::grant_premium(&conn, user_id));

    match outcome {
        Ok(true) => {
            tracing::info!(
                "Premium granted: user_id={}, session={}",
                user_id,
                session.id
            );
            Ok(())
        }
        Ok(false) => store_failure(
            state,
            user_id,
            &session.id,
            "no user record for webhook identity",
        ),
        Err(e) => store_failure(state, user_id, &session.id, &e.to_string()),
    }
}

/// Store-write failure policy. With `ack_store_failures` set (the default)
/// the event is acknowledged and the failure left to operator-facing logs
/// and reconciliation; otherwise a 500 makes Stripe redeliver.
fn store_failure(
    state: &AppState,
    user_id: &str,
    session_id: &str,
    reason: &str,
) -> Result<(), WebhookResult> {
    tracing::error!(
        "Entitlement update failed: user_id={}, session={}: {}",
        user_id,
        session_id,
        reason
    );
    if state.ack_store_failures {
        Ok(())
    } else {
        Err((StatusCode::INTERNAL_SERVER_ERROR, "Entitlement update failed"))
    }
}

fn process_webhook(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<(), WebhookResult> {
    let signature = extract_signature(headers)?;

    // Verify before parsing - nothing in the body is trusted yet.
    match state.stripe.verify_webhook_signature(body, &signature) {
        Ok(true) => {}
        Ok(false) => return Err((StatusCode::UNAUTHORIZED, "Invalid signature")),
        Err(AppError::Internal(e)) => {
            tracing::error!("Signature verification error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Signature verification failed",
            ));
        }
        Err(e) => {
            tracing::warn!("Malformed Stripe signature header: {}", e);
            return Err((StatusCode::BAD_REQUEST, "Invalid signature header"));
        }
    }

    match parse_event(body)? {
        WebhookEvent::CheckoutCompleted(session) => apply_entitlement(state, &session),
        WebhookEvent::Ignored { event_type } => {
            tracing::debug!("Ignoring Stripe event: {}", event_type);
            Ok(())
        }
    }
}

/// Axum handler for Stripe webhooks.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process_webhook(&state, &headers, &body) {
        Ok(()) => (StatusCode::OK, Json(WebhookAck { received: true })).into_response(),
        Err((status, message)) => (status, message).into_response(),
    }
}
