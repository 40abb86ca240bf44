pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::scoring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/match_cv", post(handlers::handle_match_cv))
        .with_state(state)
}
