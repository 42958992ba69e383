//! Router assembly

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route(
            "/retiros",
            post(handlers::create_withdrawal).get(handlers::list_withdrawals),
        )
        .route("/procesar-retiro", post(handlers::process_withdrawal))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
