use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Genre, Mpa},
};

pub async fn genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.reference.genres().await?))
}

pub async fn genre(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.reference.genre(id).await?))
}

pub async fn mpa_ratings(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Mpa>>> {
    Ok(Json(state.reference.mpa_ratings().await?))
}

pub async fn mpa(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<Mpa>> {
    Ok(Json(state.reference.mpa(id).await?))
}
