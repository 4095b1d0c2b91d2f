//! KeluhKesah API Server
//!
//! HTTP server for the anonymous confession feed: mood-tagged posts,
//! threaded comments, and per-client likes. Submissions are validated,
//! profanity-masked, and rate limited per hashed client identity before
//! anything is stored.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings (localhost:3002, ./keluhkesah_data)
//! keluhkesah-server
//!
//! # Run on custom address
//! keluhkesah-server --bind 0.0.0.0:8080
//!
//! # Enable debug logging
//! RUST_LOG=debug keluhkesah-server
//!
//! # Store data elsewhere
//! KELUHKESAH_DATA_DIR=/var/lib/keluhkesah keluhkesah-server
//!
//! # Run without persistence (testing)
//! KELUHKESAH_DATA_DIR=:memory: keluhkesah-server
//!
//! # Trust reverse-proxy client headers (X-Forwarded-For, X-Real-IP)
//! TRUST_PROXY_HEADERS=true keluhkesah-server
//!
//! # Adjust per-client hourly write ceilings
//! RATE_LIMIT_MAX_POSTS=10 RATE_LIMIT_MAX_COMMENTS=30 keluhkesah-server
//! ```

mod client_ip;
mod guard;
mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use guard::TransportGuardLayer;
use handlers::AppState;
use keluhkesah::ratelimit::RateLimitConfig;
use keluhkesah::service::FeedService;
use keluhkesah::store::rocksdb::DEFAULT_DATA_DIR;
use keluhkesah::store::{FeedStore, MemoryFeedStore, RocksDbConfig, RocksFeedStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Opens the configured feed store.
///
/// `KELUHKESAH_DATA_DIR=:memory:` selects the volatile store; a storage
/// failure also falls back to it so the server still comes up.
fn open_store(data_dir: &str) -> Arc<dyn FeedStore> {
    if data_dir == ":memory:" {
        info!("Using in-memory storage; data will not survive restarts");
        return Arc::new(MemoryFeedStore::new());
    }

    match RocksFeedStore::open(data_dir, &RocksDbConfig::for_server()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open feed storage at {}: {}", data_dir, e);
            error!("Falling back to in-memory storage; data will not survive restarts");
            Arc::new(MemoryFeedStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keluhkesah_server=info,keluhkesah=info,tower_http=debug".into()),
        )
        .init();

    // Parse command line args
    let bind_addr = std::env::args()
        .nth(1)
        .filter(|arg| arg == "--bind")
        .and_then(|_| std::env::args().nth(2))
        .unwrap_or_else(|| "127.0.0.1:3002".to_string());

    let data_dir = std::env::var("KELUHKESAH_DATA_DIR")
        .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    let store = open_store(&data_dir);

    let rate_limits = RateLimitConfig::from_env();
    info!(
        max_posts = rate_limits.max_posts,
        max_comments = rate_limits.max_comments,
        "Per-client hourly write ceilings"
    );

    let service = Arc::new(FeedService::new(store, rate_limits));
    let app_state = AppState { service };

    // Create transport guard layers
    let read_guard = TransportGuardLayer::for_reads();
    let write_guard = TransportGuardLayer::for_writes();

    // Write operations get the more restrictive guard
    let write_router = Router::new()
        .route("/api/posts", post(handlers::create_post))
        .route("/api/posts/:id/like", post(handlers::like_post))
        .route("/api/posts/:id/comments", post(handlers::create_comment))
        .with_state(app_state.clone())
        .layer(write_guard);

    // Read operations get the permissive guard
    let read_router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/stats", get(handlers::stats))
        .route("/api/posts", get(handlers::list_posts))
        .route("/api/posts/:id/comments", get(handlers::list_comments))
        .with_state(app_state)
        .layer(read_guard);

    let app = Router::new()
        .merge(write_router)
        .merge(read_router)
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("KeluhKesah API Server running on http://{}", bind_addr);
    info!("");
    info!("Endpoints:");
    info!("  POST   /api/posts              - Submit a post");
    info!("  GET    /api/posts              - List posts (?limit, ?q, ?sort=new|top)");
    info!("  POST   /api/posts/:id/like     - Like a post");
    info!("  POST   /api/posts/:id/comments - Comment on a post");
    info!("  GET    /api/posts/:id/comments - List comments (?limit)");
    info!("  GET    /api/stats              - Feed statistics");
    info!("  GET    /health                 - Health check");

    // Client IPs must be available for rate limiting and identity hashing
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
