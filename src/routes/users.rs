use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::User,
};

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(user), _): WithRejection<Json<User>, AppError>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.create(user).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(user), _): WithRejection<Json<User>, AppError>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update(user).await?))
}

pub async fn add_friend(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((id, friend_id)), _): WithRejection<Path<(i64, i64)>, AppError>,
) -> AppResult<StatusCode> {
    state.users.add_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((id, friend_id)), _): WithRejection<Path<(i64, i64)>, AppError>,
) -> AppResult<StatusCode> {
    state.users.remove_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn friends(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.friends(id).await?))
}

pub async fn common_friends(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((id, other_id)), _): WithRejection<Path<(i64, i64)>, AppError>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.common_friends(id, other_id).await?))
}
