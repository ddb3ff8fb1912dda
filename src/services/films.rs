use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    models::Film,
    storage::{FilmStore, ReferenceStore, Storage, UserStore},
    validation::{dedup_genres, validate_film},
};

pub const DEFAULT_POPULAR_COUNT: i64 = 10;

#[derive(Clone)]
pub struct FilmService {
    storage: Storage,
}

impl FilmService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn list(&self) -> AppResult<Vec<Film>> {
        let films = self.storage.list_films().await?;
        debug!(count = films.len(), "listing films");
        Ok(films)
    }

    pub async fn get(&self, id: i64) -> AppResult<Film> {
        self.storage.get_film(id).await?.ok_or_else(|| film_not_found(id))
    }

    pub async fn create(&self, film: Film) -> AppResult<Film> {
        let film = self.prepare(film).await?;
        let film = self.storage.create_film(film).await?;
        info!(film_id = ?film.id, name = %film.name, "film created");
        Ok(film)
    }

    pub async fn update(&self, film: Film) -> AppResult<Film> {
        let Some(id) = film.id else {
            return Err(AppError::validation("id required"));
        };
        if self.storage.get_film(id).await?.is_none() {
            return Err(film_not_found(id));
        }
        let film = self.prepare(film).await?;
        let film = self.storage.update_film(id, film).await?.ok_or_else(|| film_not_found(id))?;
        info!(film_id = id, name = %film.name, "film updated");
        Ok(film)
    }

    pub async fn add_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        self.ensure_film_and_user(film_id, user_id).await?;
        self.storage.add_like(film_id, user_id).await?;
        debug!(film_id, user_id, "like added");
        Ok(())
    }

    pub async fn remove_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        self.ensure_film_and_user(film_id, user_id).await?;
        self.storage.remove_like(film_id, user_id).await?;
        debug!(film_id, user_id, "like removed");
        Ok(())
    }

    /// The `count` most liked films; ties go to the lower id.
    pub async fn popular(&self, count: i64) -> AppResult<Vec<Film>> {
        if count < 1 {
            return Err(AppError::validation("count must be at least 1"));
        }
        let limit = usize::try_from(count).unwrap_or(usize::MAX);
        let films = self.storage.top_films(limit).await?;
        debug!(count, returned = films.len(), "popular films");
        Ok(films)
    }

    /// Field validation, genre de-duplication, then reference checks.
    async fn prepare(&self, mut film: Film) -> AppResult<Film> {
        validate_film(&film)?;
        film.genres = dedup_genres(film.genres);

        if self.storage.get_mpa(film.mpa.id).await?.is_none() {
            return Err(AppError::not_found(format!("mpa rating {} not found", film.mpa.id)));
        }
        for genre in &film.genres {
            if self.storage.get_genre(genre.id).await?.is_none() {
                return Err(AppError::not_found(format!("genre {} not found", genre.id)));
            }
        }
        Ok(film)
    }

    async fn ensure_film_and_user(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        if self.storage.get_film(film_id).await?.is_none() {
            return Err(film_not_found(film_id));
        }
        if self.storage.get_user(user_id).await?.is_none() {
            return Err(AppError::not_found(format!("user {user_id} not found")));
        }
        Ok(())
    }
}

fn film_not_found(id: i64) -> AppError {
    AppError::not_found(format!("film {id} not found"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use jiff::civil::date;

    use super::*;
    use crate::{
        db::connect_and_migrate,
        models::{Genre, Mpa, User},
    };

    fn film(name: &str) -> Film {
        Film {
            id: None,
            name: name.to_string(),
            description: "adipisicing".to_string(),
            release_date: date(1967, 3, 25),
            duration: 100,
            likes: BTreeSet::new(),
            genres: vec![],
            mpa: Mpa { id: 1, name: String::new() },
        }
    }

    fn user(login: &str) -> User {
        User {
            id: None,
            email: format!("{login}@mail.ru"),
            login: login.to_string(),
            name: None,
            birthday: date(1976, 8, 20),
            friends: BTreeSet::new(),
        }
    }

    async fn backends() -> Vec<Storage> {
        let db = connect_and_migrate("sqlite::memory:", 1).await.unwrap();
        vec![Storage::memory(), Storage::database(db)]
    }

    async fn seed_users(storage: &Storage, n: usize) {
        for i in 1..=n {
            storage.create_user(user(&format!("user{i}"))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids_and_round_trips() {
        for storage in backends().await {
            let service = FilmService::new(storage.clone());
            let first = service.create(film("first")).await.unwrap();
            let thriller = vec![Genre { id: 4, name: String::new() }];
            let second =
                service.create(Film { genres: thriller, ..film("second") }).await.unwrap();
            assert_eq!(first.id, Some(1), "{}", storage.kind());
            assert_eq!(second.id, Some(2), "{}", storage.kind());

            let found = service.get(2).await.unwrap();
            assert_eq!(found, second, "{}", storage.kind());
            assert_eq!(found.genres, vec![Genre { id: 4, name: "Thriller".to_string() }]);
            assert_eq!(found.mpa.name, "G");
        }
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected_before_storage() {
        for storage in backends().await {
            let service = FilmService::new(storage.clone());
            let bad = [
                Film { name: String::new(), ..film("x") },
                Film { description: "d".repeat(201), ..film("x") },
                Film { release_date: date(1890, 3, 25), ..film("x") },
                Film { duration: 0, ..film("x") },
            ];
            for f in bad {
                assert!(matches!(service.create(f).await, Err(AppError::Validation(_))));
            }
            assert!(service.list().await.unwrap().is_empty(), "{}", storage.kind());

            let boundary = Film { release_date: date(1895, 12, 28), ..film("boundary") };
            assert!(service.create(boundary).await.is_ok());
        }
    }

    #[tokio::test]
    async fn unknown_references_are_not_found() {
        for storage in backends().await {
            let service = FilmService::new(storage);
            let f = Film { mpa: Mpa { id: 99, name: String::new() }, ..film("x") };
            assert!(matches!(service.create(f).await, Err(AppError::NotFound(_))));
            let f = Film { genres: vec![Genre { id: 99, name: String::new() }], ..film("x") };
            assert!(matches!(service.create(f).await, Err(AppError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn duplicate_genres_are_stored_once() {
        for storage in backends().await {
            let service = FilmService::new(storage);
            let genres = [1, 2, 1].iter().map(|&id| Genre { id, name: String::new() }).collect();
            let created = service.create(Film { genres, ..film("dup") }).await.unwrap();
            assert_eq!(created.genres.iter().map(|g| g.id).collect::<Vec<_>>(), vec![1, 2]);
        }
    }

    #[tokio::test]
    async fn update_requires_known_id() {
        for storage in backends().await {
            let service = FilmService::new(storage);
            service.create(film("original")).await.unwrap();

            let missing_id = service.update(film("no id")).await;
            assert!(matches!(missing_id, Err(AppError::Validation(_))));

            let unknown = service.update(Film { id: Some(9999), ..film("unknown") }).await;
            assert!(matches!(unknown, Err(AppError::NotFound(_))));

            let invalid = service.update(Film { id: Some(1), duration: -5, ..film("bad") }).await;
            assert!(matches!(invalid, Err(AppError::Validation(_))));

            let updated = service
                .update(Film { id: Some(1), description: "newDesc".to_string(), ..film("newName") })
                .await
                .unwrap();
            assert_eq!(updated.name, "newName");
            assert_eq!(service.get(1).await.unwrap().description, "newDesc");
            assert_eq!(service.list().await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn like_round_trip_and_idempotence() {
        for storage in backends().await {
            seed_users(&storage, 1).await;
            let service = FilmService::new(storage);
            service.create(film("liked")).await.unwrap();
            let before = service.get(1).await.unwrap().likes;

            service.add_like(1, 1).await.unwrap();
            service.add_like(1, 1).await.unwrap();
            assert_eq!(service.get(1).await.unwrap().likes.len(), 1);

            service.remove_like(1, 1).await.unwrap();
            assert_eq!(service.get(1).await.unwrap().likes, before);
        }
    }

    #[tokio::test]
    async fn likes_require_existing_film_and_user() {
        for storage in backends().await {
            seed_users(&storage, 1).await;
            let service = FilmService::new(storage);
            service.create(film("liked")).await.unwrap();

            assert!(matches!(service.add_like(2, 1).await, Err(AppError::NotFound(_))));
            assert!(matches!(service.add_like(1, 2).await, Err(AppError::NotFound(_))));
            assert!(matches!(service.remove_like(5, 1).await, Err(AppError::NotFound(_))));
            assert!(matches!(service.get(42).await, Err(AppError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn popular_orders_by_likes_then_id() {
        for storage in backends().await {
            seed_users(&storage, 3).await;
            let service = FilmService::new(storage.clone());
            for name in ["film_name1", "film_name2", "film_name3", "film_name4"] {
                service.create(film(name)).await.unwrap();
            }
            for (film_id, user_id) in [(3, 1), (3, 2), (3, 3), (2, 1), (2, 2), (1, 1), (4, 3)] {
                service.add_like(film_id, user_id).await.unwrap();
            }

            let top = service.popular(3).await.unwrap();
            let ids: Vec<i64> = top.iter().map(|f| f.id.unwrap()).collect();
            assert_eq!(ids, vec![3, 2, 1], "{}", storage.kind());

            let all = service.popular(DEFAULT_POPULAR_COUNT).await.unwrap();
            let all: Vec<i64> = all.iter().map(|f| f.id.unwrap()).collect();
            assert_eq!(all, vec![3, 2, 1, 4]);

            assert!(matches!(service.popular(0).await, Err(AppError::Validation(_))));
            assert!(matches!(service.popular(-3).await, Err(AppError::Validation(_))));
        }
    }
}
