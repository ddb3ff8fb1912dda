mod films;
mod reference;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/films", get(films::list).post(films::create).put(films::update))
        .route("/films/popular", get(films::popular))
        .route("/films/{id}", get(films::get))
        .route("/films/{id}/like/{user_id}", put(films::add_like).delete(films::remove_like))
        .route("/users", get(users::list).post(users::create).put(users::update))
        .route("/users/{id}", get(users::get))
        .route("/users/{id}/friends", get(users::friends))
        .route(
            "/users/{id}/friends/{friend_id}",
            put(users::add_friend).delete(users::remove_friend),
        )
        .route("/users/{id}/friends/common/{other_id}", get(users::common_friends))
        .route("/genres", get(reference::genres))
        .route("/genres/{id}", get(reference::genre))
        .route("/mpa", get(reference::mpa_ratings))
        .route("/mpa/{id}", get(reference::mpa))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}
