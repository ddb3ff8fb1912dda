//! Orchestration between the HTTP handlers and storage: validation runs
//! before any write, referenced entities are checked for existence, and
//! unknown ids surface as [`AppError::NotFound`](crate::error::AppError).

mod films;
mod reference;
mod users;

pub use self::{
    films::{DEFAULT_POPULAR_COUNT, FilmService},
    reference::ReferenceService,
    users::UserService,
};
