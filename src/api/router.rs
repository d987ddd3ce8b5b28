use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    let system = Router::new()
        .route("/health", get(handlers::system::health_check))
        .route("/metrics", get(handlers::system::render_metrics));

    let api = Router::new()
        // Whale tracking
        .route("/api/whale-tracker", post(handlers::whales::track))
        .route("/api/whales", get(handlers::whales::list))
        .route("/api/whales/:address", get(handlers::whales::detail))
        .route("/api/whales/:address/update", post(handlers::whales::update))
        // Chat sentiment
        .route("/api/telegram/sentiment", get(handlers::sentiment::all))
        .route("/api/telegram/sentiment/:token", get(handlers::sentiment::token))
        .route("/api/telegram/messages", get(handlers::sentiment::messages))
        .route("/api/telegram/analyze", post(handlers::sentiment::analyze));

    // The dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    system
        .merge(api)
        .fallback(handlers::system::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
