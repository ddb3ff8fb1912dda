use std::{cmp::Reverse, collections::BTreeMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::debug;

use super::{FilmStore, GENRES, MPA_RATINGS, ReferenceStore, UserStore};
use crate::{
    error::AppResult,
    models::{Film, Genre, Mpa, User},
};

/// Process-local backend. A single mutex guards every map, so "compute next
/// id, insert" and the read-modify-write relationship updates are atomic.
#[derive(Clone)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

struct MemoryState {
    films: BTreeMap<i64, Film>,
    users: BTreeMap<i64, User>,
    genres: BTreeMap<i64, String>,
    mpa: BTreeMap<i64, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let state = MemoryState {
            films: BTreeMap::new(),
            users: BTreeMap::new(),
            genres: GENRES.iter().map(|(id, name)| (*id, name.to_string())).collect(),
            mpa: MPA_RATINGS.iter().map(|(id, name)| (*id, name.to_string())).collect(),
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn next_id<V>(map: &BTreeMap<i64, V>) -> i64 {
    map.keys().next_back().map_or(1, |max| max + 1)
}

impl MemoryState {
    fn with_reference_names(&self, mut film: Film) -> Film {
        if let Some(name) = self.mpa.get(&film.mpa.id) {
            film.mpa.name = name.clone();
        }
        for genre in &mut film.genres {
            if let Some(name) = self.genres.get(&genre.id) {
                genre.name = name.clone();
            }
        }
        film
    }
}

impl FilmStore for MemoryStorage {
    async fn list_films(&self) -> AppResult<Vec<Film>> {
        let state = self.state.lock().await;
        Ok(state.films.values().cloned().collect())
    }

    async fn get_film(&self, id: i64) -> AppResult<Option<Film>> {
        let state = self.state.lock().await;
        Ok(state.films.get(&id).cloned())
    }

    async fn create_film(&self, film: Film) -> AppResult<Film> {
        let mut state = self.state.lock().await;
        let id = next_id(&state.films);
        let mut film = state.with_reference_names(film);
        film.id = Some(id);
        film.likes.clear();
        state.films.insert(id, film.clone());
        debug!(film_id = id, "film stored in memory");
        Ok(film)
    }

    async fn update_film(&self, id: i64, film: Film) -> AppResult<Option<Film>> {
        let mut state = self.state.lock().await;
        let Some(likes) = state.films.get(&id).map(|f| f.likes.clone()) else {
            return Ok(None);
        };
        let mut film = state.with_reference_names(film);
        film.id = Some(id);
        film.likes = likes;
        state.films.insert(id, film.clone());
        Ok(Some(film))
    }

    async fn add_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(film) = state.films.get_mut(&film_id) {
            film.likes.insert(user_id);
        }
        Ok(())
    }

    async fn remove_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(film) = state.films.get_mut(&film_id) {
            film.likes.remove(&user_id);
        }
        Ok(())
    }

    async fn top_films(&self, limit: usize) -> AppResult<Vec<Film>> {
        let state = self.state.lock().await;
        let mut films: Vec<Film> = state.films.values().cloned().collect();
        films.sort_by_key(|f| (Reverse(f.like_count()), f.id));
        films.truncate(limit);
        Ok(films)
    }
}

impl UserStore for MemoryStorage {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn create_user(&self, mut user: User) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let id = next_id(&state.users);
        user.id = Some(id);
        user.friends.clear();
        state.users.insert(id, user.clone());
        debug!(user_id = id, "user stored in memory");
        Ok(user)
    }

    async fn update_user(&self, id: i64, mut user: User) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(friends) = state.users.get(&id).map(|u| u.friends.clone()) else {
            return Ok(None);
        };
        user.id = Some(id);
        user.friends = friends;
        state.users.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.friends.insert(friend_id);
        }
        Ok(())
    }

    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.friends.remove(&friend_id);
        }
        Ok(())
    }

    async fn add_mutual_friends(&self, a: i64, b: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&a) || !state.users.contains_key(&b) {
            return Ok(());
        }
        for (user_id, friend_id) in [(a, b), (b, a)] {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.friends.insert(friend_id);
            }
        }
        Ok(())
    }

    async fn remove_mutual_friends(&self, a: i64, b: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for (user_id, friend_id) in [(a, b), (b, a)] {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.friends.remove(&friend_id);
            }
        }
        Ok(())
    }

    async fn friends_of(&self, user_id: i64) -> AppResult<Vec<User>> {
        let state = self.state.lock().await;
        let Some(user) = state.users.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(user.friends.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }
}

impl ReferenceStore for MemoryStorage {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let state = self.state.lock().await;
        Ok(state.genres.iter().map(|(id, name)| Genre { id: *id, name: name.clone() }).collect())
    }

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>> {
        let state = self.state.lock().await;
        Ok(state.genres.get(&id).map(|name| Genre { id, name: name.clone() }))
    }

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        let state = self.state.lock().await;
        Ok(state.mpa.iter().map(|(id, name)| Mpa { id: *id, name: name.clone() }).collect())
    }

    async fn get_mpa(&self, id: i64) -> AppResult<Option<Mpa>> {
        let state = self.state.lock().await;
        Ok(state.mpa.get(&id).map(|name| Mpa { id, name: name.clone() }))
    }
}
