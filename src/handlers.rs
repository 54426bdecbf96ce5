use crate::errors::AppError;
use crate::models::{EntryParams, LeaderboardQuery};
use crate::state::AppState;
use crate::ui::render_index;
use crate::view::{CheckinView, LeaderboardView, PageView};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Html,
    Json,
};

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<EntryParams>,
) -> Html<String> {
    let page = state.orchestrator.load_page(&params).await;
    Html(render_index(&page, &params, state.refresh_every))
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn get_session(
    State(state): State<AppState>,
    Query(params): Query<EntryParams>,
) -> Json<PageView> {
    Json(state.orchestrator.load_page(&params).await)
}

pub async fn check_in(
    State(state): State<AppState>,
    payload: Result<Json<EntryParams>, JsonRejection>,
) -> Result<Json<CheckinView>, AppError> {
    let Json(params) = payload?;
    Ok(Json(state.orchestrator.check_in(&params).await))
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<LeaderboardView> {
    let viewer = query.email.as_deref().map(str::trim);
    let snapshot = state.orchestrator.leaderboard().snapshot().await;
    Json(snapshot.render(viewer))
}
