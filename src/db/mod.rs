mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::StripeClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and the Stripe client.
///
/// Constructed once in `main` and injected into handlers via axum state -
/// there is no ambient global client or connection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub stripe: StripeClient,
    /// Configured public base URL, used when a request has no Origin header
    pub public_url: Option<String>,
    /// Acknowledge webhooks even when the entitlement write fails
    pub ack_store_failures: bool,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
