use std::{
    cmp::Reverse,
    collections::{BTreeSet, HashMap},
};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, Select, Set, Statement, TransactionTrait, Value,
    sea_query::{OnConflict, Query},
};
use tracing::debug;

use super::{FilmStore, ReferenceStore, UserStore};
use crate::{
    entities::{film, film_genre, friend, genre, like, rating_mpa, user},
    error::{AppError, AppResult},
    mapper::{FilmRow, fold_film_rows},
    models::{Film, Genre, Mpa, User},
};

const FILM_ROWS_SELECT: &str = "SELECT f.id, f.name, f.description, f.release_date, f.duration, \
     l.user_id AS like_id, f.rating_mpa_id AS mpa_id, COALESCE(m.name, '') AS mpa_name, \
     g.id AS genre_id, g.name AS genre_name \
     FROM films AS f \
     LEFT JOIN likes AS l ON f.id = l.film_id \
     LEFT JOIN rating_mpa AS m ON f.rating_mpa_id = m.id \
     LEFT JOIN films_genre AS fg ON f.id = fg.film_id \
     LEFT JOIN genres AS g ON fg.genre_id = g.id";

const FILM_ROWS_ORDER: &str = " ORDER BY f.id, fg.id, l.user_id";

// Ranking runs in SQL; only the limit is bound.
const TOP_FILMS_FILTER: &str = " WHERE f.id IN (SELECT ranked.id FROM films AS ranked \
     LEFT JOIN likes AS rl ON ranked.id = rl.film_id \
     GROUP BY ranked.id \
     ORDER BY COUNT(rl.user_id) DESC, ranked.id ASC \
     LIMIT ?)";

/// Relational backend over sea-orm. Film reads go through one join query
/// folded by [`fold_film_rows`]; film writes run in a transaction so the film
/// row and its genre links land together.
#[derive(Clone)]
pub struct DbStorage {
    db: DatabaseConnection,
}

impl DbStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// `filter` is spliced between the join and the ordering; `values` bind its
    /// placeholders.
    async fn load_films(&self, filter: &str, values: Vec<Value>) -> AppResult<Vec<Film>> {
        let sql = format!("{FILM_ROWS_SELECT}{filter}{FILM_ROWS_ORDER}");
        let rows = FilmRow::find_by_statement(Statement::from_sql_and_values(
            self.db.get_database_backend(),
            sql,
            values,
        ))
        .all(&self.db)
        .await?;

        debug!(rows = rows.len(), "folding film rows");
        fold_film_rows(rows)
    }

    async fn reload_film(&self, id: i64) -> AppResult<Film> {
        self.get_film(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("film {id} missing after write")))
    }

    /// Attaches friend sets to `models`. `edges` must select at least the
    /// friend rows owned by those users.
    async fn hydrate_users(
        &self,
        models: Vec<user::Model>,
        edges: Select<friend::Entity>,
    ) -> AppResult<Vec<User>> {
        let edges = edges.all(&self.db).await?;

        let mut friends: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for edge in edges {
            friends.entry(edge.user_id).or_default().insert(edge.friend_id);
        }

        models
            .into_iter()
            .map(|m| {
                let set = friends.remove(&m.id).unwrap_or_default();
                user_from_model(m, set)
            })
            .collect()
    }
}

fn film_active_model(id: Option<i64>, film: &Film) -> film::ActiveModel {
    film::ActiveModel {
        id: id.map(Set).unwrap_or_default(),
        name: Set(film.name.clone()),
        description: Set(film.description.clone()),
        release_date: Set(film.release_date.to_string()),
        duration: Set(film.duration),
        rating_mpa_id: Set(film.mpa.id),
    }
}

fn user_active_model(id: Option<i64>, u: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: id.map(Set).unwrap_or_default(),
        email: Set(u.email.clone()),
        login: Set(u.login.clone()),
        name: Set(u.name.clone().unwrap_or_else(|| u.login.clone())),
        birthday: Set(u.birthday.to_string()),
    }
}

fn user_from_model(m: user::Model, friends: BTreeSet<i64>) -> AppResult<User> {
    Ok(User {
        id: Some(m.id),
        email: m.email,
        login: m.login,
        name: Some(m.name),
        birthday: m.birthday.parse()?,
        friends,
    })
}

async fn insert_friend_edge<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    friend_id: i64,
) -> AppResult<()> {
    let model = friend::ActiveModel { user_id: Set(user_id), friend_id: Set(friend_id) };
    friend::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([friend::Column::UserId, friend::Column::FriendId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn delete_friend_edge<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    friend_id: i64,
) -> AppResult<()> {
    friend::Entity::delete_many()
        .filter(friend::Column::UserId.eq(user_id))
        .filter(friend::Column::FriendId.eq(friend_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn insert_genre_links<C: ConnectionTrait>(
    conn: &C,
    film_id: i64,
    genres: &[Genre],
) -> AppResult<()> {
    if genres.is_empty() {
        return Ok(());
    }
    let links = genres.iter().map(|g| film_genre::ActiveModel {
        id: Default::default(),
        film_id: Set(film_id),
        genre_id: Set(g.id),
    });
    film_genre::Entity::insert_many(links).exec_without_returning(conn).await?;
    Ok(())
}

impl FilmStore for DbStorage {
    async fn list_films(&self) -> AppResult<Vec<Film>> {
        self.load_films("", Vec::new()).await
    }

    async fn get_film(&self, id: i64) -> AppResult<Option<Film>> {
        Ok(self.load_films(" WHERE f.id = ?", vec![id.into()]).await?.into_iter().next())
    }

    async fn create_film(&self, film: Film) -> AppResult<Film> {
        let txn = self.db.begin().await?;

        let id =
            film::Entity::insert(film_active_model(None, &film)).exec(&txn).await?.last_insert_id;
        insert_genre_links(&txn, id, &film.genres).await?;

        txn.commit().await?;
        debug!(film_id = id, genres = film.genres.len(), "film inserted");

        self.reload_film(id).await
    }

    async fn update_film(&self, id: i64, film: Film) -> AppResult<Option<Film>> {
        let txn = self.db.begin().await?;

        if film::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Ok(None);
        }

        film::Entity::update(film_active_model(Some(id), &film)).exec(&txn).await?;
        film_genre::Entity::delete_many()
            .filter(film_genre::Column::FilmId.eq(id))
            .exec(&txn)
            .await?;
        insert_genre_links(&txn, id, &film.genres).await?;

        txn.commit().await?;
        debug!(film_id = id, "film updated");

        self.reload_film(id).await.map(Some)
    }

    async fn add_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        let model = like::ActiveModel { film_id: Set(film_id), user_id: Set(user_id) };
        like::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([like::Column::FilmId, like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn remove_like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        like::Entity::delete_many()
            .filter(like::Column::FilmId.eq(film_id))
            .filter(like::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn top_films(&self, limit: usize) -> AppResult<Vec<Film>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut films = self.load_films(TOP_FILMS_FILTER, vec![limit.into()]).await?;
        films.sort_by_key(|f| (Reverse(f.like_count()), f.id));
        Ok(films)
    }
}

impl UserStore for DbStorage {
    async fn list_users(&self) -> AppResult<Vec<User>> {
        let models = user::Entity::find().order_by_asc(user::Column::Id).all(&self.db).await?;
        self.hydrate_users(models, friend::Entity::find()).await
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let Some(model) = user::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let edges = friend::Entity::find().filter(friend::Column::UserId.eq(id));
        Ok(self.hydrate_users(vec![model], edges).await?.into_iter().next())
    }

    async fn create_user(&self, u: User) -> AppResult<User> {
        let id =
            user::Entity::insert(user_active_model(None, &u)).exec(&self.db).await?.last_insert_id;
        debug!(user_id = id, "user inserted");
        Ok(User { id: Some(id), friends: BTreeSet::new(), ..u })
    }

    async fn update_user(&self, id: i64, u: User) -> AppResult<Option<User>> {
        if user::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Ok(None);
        }
        user::Entity::update(user_active_model(Some(id), &u)).exec(&self.db).await?;
        self.get_user(id).await
    }

    async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        insert_friend_edge(&self.db, user_id, friend_id).await
    }

    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        delete_friend_edge(&self.db, user_id, friend_id).await
    }

    async fn add_mutual_friends(&self, a: i64, b: i64) -> AppResult<()> {
        let txn = self.db.begin().await?;
        insert_friend_edge(&txn, a, b).await?;
        insert_friend_edge(&txn, b, a).await?;
        txn.commit().await?;
        debug!(a, b, "mutual friendship stored");
        Ok(())
    }

    async fn remove_mutual_friends(&self, a: i64, b: i64) -> AppResult<()> {
        let txn = self.db.begin().await?;
        delete_friend_edge(&txn, a, b).await?;
        delete_friend_edge(&txn, b, a).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn friends_of(&self, user_id: i64) -> AppResult<Vec<User>> {
        let friend_ids = Query::select()
            .column(friend::Column::FriendId)
            .from(friend::Entity)
            .and_where(friend::Column::UserId.eq(user_id))
            .to_owned();

        let models = user::Entity::find()
            .filter(user::Column::Id.in_subquery(friend_ids.clone()))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        let edges = friend::Entity::find().filter(friend::Column::UserId.in_subquery(friend_ids));
        self.hydrate_users(models, edges).await
    }
}

impl ReferenceStore for DbStorage {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let rows = genre::Entity::find().order_by_asc(genre::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Genre::from).collect())
    }

    async fn get_genre(&self, id: i64) -> AppResult<Option<Genre>> {
        Ok(genre::Entity::find_by_id(id).one(&self.db).await?.map(Genre::from))
    }

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        let rows =
            rating_mpa::Entity::find().order_by_asc(rating_mpa::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Mpa::from).collect())
    }

    async fn get_mpa(&self, id: i64) -> AppResult<Option<Mpa>> {
        Ok(rating_mpa::Entity::find_by_id(id).one(&self.db).await?.map(Mpa::from))
    }
}
