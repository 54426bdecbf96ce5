use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/api/session", get(handlers::get_session))
        .route("/api/checkin", post(handlers::check_in))
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .with_state(state)
}
