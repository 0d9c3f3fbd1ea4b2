use std::env;

use thiserror::Error;

/// Fallback origin for redirect URLs when neither the caller nor the
/// environment supplies one. Matches the local dev frontend.
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Stripe credentials. Both fields are required at startup - the server
/// refuses to boot without them rather than failing opaquely on first use.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Public base URL used for redirect targets when the request carries
    /// no Origin header (e.g. webhooks, server-to-server calls).
    pub public_url: Option<String>,
    pub stripe: StripeConfig,
    /// Whether the webhook handler acknowledges Stripe even when the
    /// entitlement write fails. `true` (default) relies on out-of-band
    /// reconciliation; `false` returns 500 so Stripe redelivers.
    pub ack_store_failures: bool,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("POLEPASS_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = match env::var("PORT") {
            Ok(p) => p
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", p.clone()))?,
            Err(_) => 3000,
        };

        let stripe = StripeConfig {
            secret_key: required("STRIPE_SECRET_KEY")?,
            webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        };

        let ack_store_failures = match env::var("WEBHOOK_ACK_STORE_FAILURES") {
            Ok(v) => parse_bool("WEBHOOK_ACK_STORE_FAILURES", &v)?,
            Err(_) => true,
        };

        Ok(Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "polepass.db".to_string()),
            public_url: env::var("PUBLIC_URL").ok().filter(|v| !v.is_empty()),
            stripe,
            ack_store_failures,
            dev_mode,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::Invalid(name, other.to_string())),
    }
}
