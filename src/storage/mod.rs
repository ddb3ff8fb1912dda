//! Storage contract shared by the in-memory and the relational backends.
//!
//! Stores deal in already-validated entities: the services run field
//! validation and existence checks first. Lookups return `Option` and leave
//! the choice of error message to the caller.

pub mod db;
pub mod memory;

use std::future::Future;

use sea_orm::DatabaseConnection;

use crate::{
    error::AppResult,
    models::{Film, Genre, Mpa, User},
};

pub use migration::{GENRES, MPA_RATINGS};

pub use self::{db::DbStorage, memory::MemoryStorage};

pub trait FilmStore {
    /// All films, ascending by id.
    fn list_films(&self) -> impl Future<Output = AppResult<Vec<Film>>> + Send;

    fn get_film(&self, id: i64) -> impl Future<Output = AppResult<Option<Film>>> + Send;

    /// Assigns the next id and inserts the film as one step. Genre and MPA
    /// names are taken from the reference data.
    fn create_film(&self, film: Film) -> impl Future<Output = AppResult<Film>> + Send;

    /// Replaces scalar fields and genres; likes are kept. `None` when the id is
    /// unknown.
    fn update_film(
        &self,
        id: i64,
        film: Film,
    ) -> impl Future<Output = AppResult<Option<Film>>> + Send;

    fn add_like(&self, film_id: i64, user_id: i64) -> impl Future<Output = AppResult<()>> + Send;

    fn remove_like(&self, film_id: i64, user_id: i64)
    -> impl Future<Output = AppResult<()>> + Send;

    /// At most `limit` films, by like count descending then id ascending.
    fn top_films(&self, limit: usize) -> impl Future<Output = AppResult<Vec<Film>>> + Send;
}

pub trait UserStore {
    /// All users, ascending by id.
    fn list_users(&self) -> impl Future<Output = AppResult<Vec<User>>> + Send;

    fn get_user(&self, id: i64) -> impl Future<Output = AppResult<Option<User>>> + Send;

    /// Assigns the next id and inserts the user as one step.
    fn create_user(&self, user: User) -> impl Future<Output = AppResult<User>> + Send;

    /// Replaces profile fields; friends are kept. `None` when the id is unknown.
    fn update_user(
        &self,
        id: i64,
        user: User,
    ) -> impl Future<Output = AppResult<Option<User>>> + Send;

    /// Records the directed edge `user_id -> friend_id`. Idempotent.
    fn add_friend(&self, user_id: i64, friend_id: i64)
    -> impl Future<Output = AppResult<()>> + Send;

    fn remove_friend(
        &self,
        user_id: i64,
        friend_id: i64,
    ) -> impl Future<Output = AppResult<()>> + Send;

    /// Records both `a -> b` and `b -> a` as one write: either both edges
    /// exist afterwards or neither was added.
    fn add_mutual_friends(&self, a: i64, b: i64) -> impl Future<Output = AppResult<()>> + Send;

    /// Removes both `a -> b` and `b -> a` as one write.
    fn remove_mutual_friends(&self, a: i64, b: i64)
    -> impl Future<Output = AppResult<()>> + Send;

    /// Users that `user_id` lists as friends, ascending by id.
    fn friends_of(&self, user_id: i64) -> impl Future<Output = AppResult<Vec<User>>> + Send;
}

pub trait ReferenceStore {
    fn list_genres(&self) -> impl Future<Output = AppResult<Vec<Genre>>> + Send;

    fn get_genre(&self, id: i64) -> impl Future<Output = AppResult<Option<Genre>>> + Send;

    fn list_mpa(&self) -> impl Future<Output = AppResult<Vec<Mpa>>> + Send;

    fn get_mpa(&self, id: i64) -> impl Future<Output = AppResult<Option<Mpa>>> + Send;
}

/// The backend chosen at startup.
#[derive(Clone)]
pub enum Storage {
    Memory(MemoryStorage),
    Database(DbStorage),
}

impl Storage {
    pub fn memory() -> Self {
        Storage::Memory(MemoryStorage::new())
    }

    pub fn database(db: DatabaseConnection) -> Self {
        Storage::Database(DbStorage::new(db))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Storage::Memory(_) => "memory",
            Storage::Database(_) => "database",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Storage::Memory($store) => $call.await,
            Storage::Database($store) => $call.await,
        }
    };
}

impl FilmStore for Storage {
    async fn list_films(&self) -> AppResult<Vec<Film>> {
        dispatch!(self, s => s.list_films())
    }

    async fn get_film(&self, id: i64) -> AppResult<Option<Film>> {
        dispatch!(self, s => s.get_film(id))
    }

    async fn create_film(&self, film: Film) -> AppResult<Film> {
        dispatch!(self, s => s.create_film(film))
    }

    async fn update_film(&self, id: i64, film: Film) -> AppResult<Option<Film>> {
        dispatch!(self, s => s.update_film(id, film))
    }

    async fn add_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        dispatch!(self, s => s.add_like(film_id, user_id))
    }

    async fn remove_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        dispatch!(self, s => s.remove_like(film_id, user_id))
    }

    async fn top_films(&self, limit: usize) -> AppResult<Vec<Film>> {
        dispatch!(self, s => s.top_films(limit))
    }
}

impl UserStore for Storage {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        dispatch!(self, s => s.list_users())
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        dispatch!(self, s => s.get_user(id))
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        dispatch!(self, s => s.create_user(user))
    }

    async fn update_user(&self, id: i64, user: User) -> AppResult<Option<User>> {
        dispatch!(self, s => s.update_user(id, user))
    }

    async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        dispatch!(self, s => s.add_friend(user_id, friend_id))
    }

    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        dispatch!(self, s => s.remove_friend(user_id, friend_id))
    }

    async fn add_mutual_friends(&self, a: i64, b: i64) -> AppResult<()> {
        dispatch!(self, s => s.add_mutual_friends(a, b))
    }

    async fn remove_mutual_friends(&self, a: i64, b: i64) -> AppResult<()> {
        dispatch!(self, s => s.remove_mutual_friends(a, b))
    }

    async fn friends_of(&self, user_id: i64) -> AppResult<Vec<User>> {
        dispatch!(self, s => s.friends_of(user_id))
    }
}

impl ReferenceStore for Storage {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        dispatch!(self, s => s.list_genres())
    }

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>> {
        dispatch!(self, s => s.get_genre(id))
    }

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        dispatch!(self, s => s.list_mpa())
    }

    async fn get_mpa(&self, id: i64) -> AppResult<Option<Mpa>> {
        dispatch!(self, s => s.get_mpa(id))
    }
}
