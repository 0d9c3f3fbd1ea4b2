use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::StripeConfig;
use crate::error::{msg, AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The one product this backend sells. Price data is sent inline with the
/// session rather than referencing a dashboard Price object.
pub const PRODUCT_NAME: &str = "PoleGuessr Premium Pass";
pub const PRODUCT_DESCRIPTION: &str =
    "Unlock exclusive backgrounds, profile backgrounds, and premium tags";
pub const PRODUCT_CURRENCY: &str = "usd";
pub const PRODUCT_UNIT_AMOUNT: i64 = 499; // $4.99 in cents

#[derive(Debug, Deserialize)]
struct CreateCheckoutSessionResponse {
    id: String,
}

/// Metadata embedded in a checkout session at creation time and echoed back
/// verbatim in the completion webhook. This is the only correlation between
/// the Session Initiator and the Confirmation Handler.
#[derive(Debug, Clone)]
pub struct SessionMetadata {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    webhook_secret: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    /// Create a checkout session for the premium pass.
    ///
    /// `success_url` carries Stripe's `{CHECKOUT_SESSION_ID}` placeholder -
    /// Stripe substitutes it when redirecting, this service never does.
    /// Returns the opaque session id.
    pub async fn create_checkout_session(
        &self,
        metadata: &SessionMetadata,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String> {
        let unit_amount = PRODUCT_UNIT_AMOUNT.to_string();
        let response = self
            .client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("mode", "payment"),
                ("payment_method_types[0]", "card"),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
                ("line_items[0][price_data][currency]", PRODUCT_CURRENCY),
                ("line_items[0][price_data][product_data][name]", PRODUCT_NAME),
                (
                    "line_items[0][price_data][product_data][description]",
                    PRODUCT_DESCRIPTION,
                ),
                ("line_items[0][price_data][unit_amount]", &unit_amount),
                ("line_items[0][quantity]", "1"),
                ("metadata[user_id]", &metadata.user_id),
                ("metadata[username]", &metadata.username),
            ])
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!("Stripe API error: {}", error_text)));
        }

        let session: CreateCheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse Stripe response: {}", e)))?;

        Ok(session.id)
    }

    /// Provider-connectivity check: fetch the account balance with the
    /// configured key. Succeeds iff the key is valid and Stripe is reachable.
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get("https://api.stripe.com/v1/balance")
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Stripe returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Maximum age of a webhook timestamp before it's rejected (in seconds).
    /// Stripe recommends 300 seconds (5 minutes).
    const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

    /// Verify a Stripe webhook signature against the raw request body.
    ///
    /// Must be called before the body is parsed - nothing in an unverified
    /// payload can be trusted.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        // Stripe signature format: t=timestamp,v1=signature
        let parts: Vec<&str> = signature.split(',').collect();

        let mut timestamp = None;
        let mut sig_v1 = None;

        for part in parts {
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = Some(t);
            } else if let Some(s) = part.strip_prefix("v1=") {
                sig_v1 = Some(s);
            }
        }

        let timestamp_str =
            timestamp.ok_or_else(|| AppError::BadRequest(msg::INVALID_SIGNATURE_FORMAT.into()))?;
        let sig_v1 =
            sig_v1.ok_or_else(|| AppError::BadRequest(msg::INVALID_SIGNATURE_FORMAT.into()))?;

        // Reject webhooks older than WEBHOOK_TIMESTAMP_TOLERANCE_SECS to
        // limit the replay window.
        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| AppError::BadRequest(msg::INVALID_TIMESTAMP_IN_SIGNATURE.into()))?;

        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
            tracing::warn!(
                "Stripe webhook rejected: timestamp too old (age={}s, max={}s)",
                age,
                Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS
            );
            return Ok(false);
        }

        // Also reject timestamps from the future (clock skew tolerance: 60 seconds)
        if age < -60 {
            tracing::warn!(
                "Stripe webhook rejected: timestamp in the future (age={}s)",
                age
            );
            return Ok(false);
        }

        let signed_payload = format!("{}.{}", timestamp_str, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal(msg::INVALID_WEBHOOK_SECRET.into()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison to prevent timing attacks. The length
        // check is not constant-time, but signature length is not secret
        // (always 64 hex chars for SHA-256).
        let expected_bytes = expected.as_bytes();
        let provided_bytes = sig_v1.as_bytes();

        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }
}

/// Generic Stripe webhook event - object is parsed based on event_type
#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Session snapshot delivered in `checkout.session.completed`.
#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub metadata: StripeSessionMetadata,
}

/// Metadata echoed back by Stripe. Fields are optional here because the
/// payload is external input; the initiator guarantees they are set for
/// sessions this service created.
#[derive(Debug, Default, Deserialize)]
pub struct StripeSessionMetadata {
    pub user_id: Option<String>,
    pub username: Option<String>,
}
