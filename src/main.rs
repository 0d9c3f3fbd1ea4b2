use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use polepass::config::Config;
use polepass::db::{create_pool, init_db, queries, AppState};
use polepass::handlers;
use polepass::models::CreateUser;
use polepass::payments::StripeClient;

#[derive(Parser, Debug)]
#[command(name = "polepass")]
#[command(about = "Premium pass checkout backend for PoleGuessr")]
struct Cli {
    /// Seed the database with a demo user (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Seeds a demo user so the checkout flow can be exercised end to end
/// without the game's registration service running.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    match queries::get_user_by_id(&conn, "demo-user") {
        Ok(Some(_)) => {
            tracing::info!("Demo user already exists, skipping seed");
            return;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Seed check failed: {}", e);
            return;
        }
    }

    let user = queries::create_user(
        &conn,
        &CreateUser {
            id: "demo-user".to_string(),
            username: "demo".to_string(),
        },
    )
    .expect("Failed to create demo user");

    tracing::info!("Seeded demo user: {} ({})", user.id, user.username);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polepass=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration - missing Stripe secrets abort here rather than
    // failing opaquely on the first purchase.
    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create database connection pool and initialize schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        stripe: StripeClient::new(&config.stripe),
        public_url: config.public_url.clone(),
        ack_store_failures: config.ack_store_failures,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set POLEPASS_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // The frontend is served from a different origin, so the checkout
    // endpoint must be callable cross-origin.
    let app: Router = handlers::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("PolePass server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
