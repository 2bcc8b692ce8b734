use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    parse_date, AddEntryRequest, CorrectionRequest, DayView, FinalizedView, InstantiateRequest,
    SwapEntryRequest,
};
use super::services;
use crate::diet::{AdherenceReport, AdherenceState, Finalized};
use crate::errors::reject;
use crate::extractors::UserContext;
use crate::state::AppState;

pub fn day_routes() -> Router<AppState> {
    Router::new()
        .route("/days/:date", get(get_day))
        .route("/days/:date/instantiate", post(instantiate))
        .route("/days/:date/commit", post(commit))
        .route("/days/:date/entries", post(add_entry))
        .route("/days/:date/entries/:index", put(swap_entry))
        .route("/days/:date/corrections", post(correct_entry))
        .route("/days/:date/finalize", post(finalize))
        .route("/days/:date/report", get(preview_report))
}

pub fn adherence_routes() -> Router<AppState> {
    Router::new().route("/adherence", get(get_adherence))
}

fn finalized_view(done: Finalized) -> FinalizedView {
    FinalizedView {
        streak: done.state.streak(),
        xp: done.state.xp(),
        report: done.report,
        day: done.day.into(),
    }
}

#[instrument(skip(state))]
pub async fn get_day(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(date): Path<String>,
) -> Result<Json<DayView>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    let day = services::get_day(&state, user_id, date)
        .await
        .map_err(reject)?;
    Ok(Json(day.into()))
}

#[instrument(skip(state, body))]
pub async fn instantiate(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(date): Path<String>,
    Json(body): Json<InstantiateRequest>,
) -> Result<(StatusCode, Json<DayView>), (StatusCode, String)> {
    let date = parse_date(&date)?;
    let day = services::instantiate(&state, user_id, date, body.template_id, body.target)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(day.into())))
}

#[instrument(skip(state))]
pub async fn commit(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(date): Path<String>,
) -> Result<Json<DayView>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    let day = services::commit(&state, user_id, date)
        .await
        .map_err(reject)?;
    Ok(Json(day.into()))
}

#[instrument(skip(state, body))]
pub async fn add_entry(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(date): Path<String>,
    Json(body): Json<AddEntryRequest>,
) -> Result<(StatusCode, Json<DayView>), (StatusCode, String)> {
    let date = parse_date(&date)?;
    let day = services::add_entry(
        &state,
        user_id,
        date,
        body.label,
        body.item,
        body.quantity,
        body.target,
    )
    .await
    .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(day.into())))
}

#[instrument(skip(state, body))]
pub async fn swap_entry(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path((date, index)): Path<(String, usize)>,
    Json(body): Json<SwapEntryRequest>,
) -> Result<Json<DayView>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    let day = services::swap_entry(&state, user_id, date, index, body.item, body.quantity)
        .await
        .map_err(reject)?;
    Ok(Json(day.into()))
}

#[instrument(skip(state, body))]
pub async fn correct_entry(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(date): Path<String>,
    Json(body): Json<CorrectionRequest>,
) -> Result<Json<FinalizedView>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    let done = services::correct_entry(&state, user_id, date, body.index, body.item, body.quantity)
        .await
        .map_err(reject)?;
    Ok(Json(finalized_view(done)))
}

#[instrument(skip(state))]
pub async fn finalize(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(date): Path<String>,
) -> Result<Json<FinalizedView>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    let done = services::finalize(&state, user_id, date)
        .await
        .map_err(reject)?;
    Ok(Json(finalized_view(done)))
}

#[instrument(skip(state))]
pub async fn preview_report(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(date): Path<String>,
) -> Result<Json<AdherenceReport>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    let report = services::preview_report(&state, user_id, date)
        .await
        .map_err(reject)?;
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn get_adherence(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
) -> Result<Json<AdherenceState>, (StatusCode, String)> {
    let adherence = services::adherence(&state, user_id)
        .await
        .map_err(reject)?;
    Ok(Json(adherence))
}
