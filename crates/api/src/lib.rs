pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Meeting routes
    let meeting_routes = Router::new()
        .route("/", post(routes::meeting::create))
        .route("/{meeting_id}", get(routes::meeting::get))
        .route("/{meeting_id}/join", post(routes::membership::join))
        .route("/{meeting_id}/leave", post(routes::membership::leave))
        .route("/{meeting_id}/ban/{user_id}", post(routes::membership::ban))
        .route("/{meeting_id}/unban/{user_id}", post(routes::membership::unban))
        .route("/{meeting_id}/attendees", get(routes::membership::attendees))
        .route("/{meeting_id}/chat", get(ws::handler::chat_upgrade));

    let api = Router::new().nest("/meeting", meeting_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
