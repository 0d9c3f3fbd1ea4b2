//! Test utilities and fixtures for PolePass integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use polepass::config::StripeConfig;
pub use polepass::db::{init_db, queries, AppState};
pub use polepass::handlers;
pub use polepass::models::*;
pub use polepass::payments::StripeClient;

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Stripe config with a known webhook secret for signature tests
pub fn test_stripe_config() -> StripeConfig {
    StripeConfig {
        secret_key: "sk_test_xxx".to_string(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
    }
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a test user with the given id and username
pub fn create_test_user(conn: &Connection, id: &str, username: &str) -> User {
    let input = CreateUser {
        id: id.to_string(),
        username: username.to_string(),
    };
    queries::create_user(conn, &input).expect("Failed to create test user")
}

/// Create an AppState backed by an in-memory database.
///
/// Pool size is 1 so every handler call sees the same in-memory connection.
pub fn create_test_app_state() -> AppState {
    test_app_state(true)
}

/// AppState with the strict acknowledgment policy (store failures -> 500)
pub fn create_strict_test_app_state() -> AppState {
    test_app_state(false)
}

fn test_app_state(ack_store_failures: bool) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        stripe: StripeClient::new(&test_stripe_config()),
        public_url: None,
        ack_store_failures,
    }
}

/// Create a Router with all endpoints wired to the given state
pub fn app(state: AppState) -> Router {
    handlers::router().with_state(state)
}
