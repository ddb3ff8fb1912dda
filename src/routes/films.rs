use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Film, PopularQuery},
    services::DEFAULT_POPULAR_COUNT,
};

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.films.list().await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.films.get(id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(film), _): WithRejection<Json<Film>, AppError>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.films.create(film).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(film), _): WithRejection<Json<Film>, AppError>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.films.update(film).await?))
}

pub async fn add_like(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((id, user_id)), _): WithRejection<Path<(i64, i64)>, AppError>,
) -> AppResult<StatusCode> {
    state.films.add_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_like(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((id, user_id)), _): WithRejection<Path<(i64, i64)>, AppError>,
) -> AppResult<StatusCode> {
    state.films.remove_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn popular(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(q), _): WithRejection<Query<PopularQuery>, AppError>,
) -> AppResult<Json<Vec<Film>>> {
    let count = q.count.unwrap_or(DEFAULT_POPULAR_COUNT);
    Ok(Json(state.films.popular(count).await?))
}
