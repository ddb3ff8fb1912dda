use crate::{
    error::{AppError, AppResult},
    models::{Genre, Mpa},
    storage::{ReferenceStore, Storage},
};

/// Read-only access to the genre and MPA rating catalogues.
#[derive(Clone)]
pub struct ReferenceService {
    storage: Storage,
}

impl ReferenceService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn genres(&self) -> AppResult<Vec<Genre>> {
        self.storage.list_genres().await
    }

    pub async fn genre(&self, id: i64) -> AppResult<Genre> {
        self.storage
            .get_genre(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("genre {id} not found")))
    }

    pub async fn mpa_ratings(&self) -> AppResult<Vec<Mpa>> {
        self.storage.list_mpa().await
    }

    pub async fn mpa(&self, id: i64) -> AppResult<Mpa> {
        self.storage
            .get_mpa(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("mpa rating {id} not found")))
    }
}
