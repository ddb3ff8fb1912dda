//! Folds the flat `films ⟕ likes ⟕ rating_mpa ⟕ films_genre ⟕ genres` result
//! set into one [`Film`] per film id.
//!
//! The join yields one row per film×like×genre combination, so a film with
//! two likes and two genres arrives as four rows. Rows for the same film do
//! not need to be contiguous.

use std::collections::{BTreeSet, HashMap};

use sea_orm::FromQueryResult;

use crate::{
    error::AppResult,
    models::{Film, Genre, Mpa},
};

#[derive(Clone, Debug, FromQueryResult)]
pub struct FilmRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub release_date: String,
    pub duration: i32,
    pub like_id: Option<i64>,
    pub mpa_id: i64,
    pub mpa_name: String,
    pub genre_id: Option<i64>,
    pub genre_name: Option<String>,
}

/// Returns one film per distinct id, in order of first appearance. Each call
/// starts from an empty working map.
pub fn fold_film_rows(rows: impl IntoIterator<Item = FilmRow>) -> AppResult<Vec<Film>> {
    let mut films: Vec<Film> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let slot = match index.get(&row.id) {
            Some(&slot) => slot,
            None => {
                films.push(Film {
                    id: Some(row.id),
                    name: row.name,
                    description: row.description,
                    release_date: row.release_date.parse()?,
                    duration: row.duration,
                    likes: BTreeSet::new(),
                    genres: Vec::new(),
                    mpa: Mpa { id: row.mpa_id, name: row.mpa_name },
                });
                index.insert(row.id, films.len() - 1);
                films.len() - 1
            },
        };
        let film = &mut films[slot];

        // NULL from the outer join, or a zero id, means "no like on this row".
        if let Some(user_id) = row.like_id.filter(|&id| id != 0) {
            film.likes.insert(user_id);
        }

        if let Some(genre_id) = row.genre_id.filter(|&id| id != 0) {
            if !film.genres.iter().any(|g| g.id == genre_id) {
                film.genres.push(Genre { id: genre_id, name: row.genre_name.unwrap_or_default() });
            }
        }
    }

    Ok(films)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn row(id: i64, like_id: Option<i64>, genre: Option<(i64, &str)>) -> FilmRow {
        FilmRow {
            id,
            name: format!("film_name{id}"),
            description: "description".to_string(),
            release_date: "1991-01-12".to_string(),
            duration: 60,
            like_id,
            mpa_id: 1,
            mpa_name: "G".to_string(),
            genre_id: genre.map(|(gid, _)| gid),
            genre_name: genre.map(|(_, name)| name.to_string()),
        }
    }

    #[test]
    fn cross_join_rows_collapse_into_one_film() {
        let rows = vec![
            row(1, Some(10), Some((1, "Comedy"))),
            row(1, Some(10), Some((2, "Drama"))),
            row(1, Some(20), Some((1, "Comedy"))),
            row(1, Some(20), Some((2, "Drama"))),
        ];
        let films = fold_film_rows(rows).unwrap();
        assert_eq!(films.len(), 1);
        let film = &films[0];
        assert_eq!(film.id, Some(1));
        assert_eq!(film.likes.iter().copied().collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(
            film.genres,
            vec![
                Genre { id: 1, name: "Comedy".to_string() },
                Genre { id: 2, name: "Drama".to_string() },
            ]
        );
        assert_eq!(film.mpa, Mpa { id: 1, name: "G".to_string() });
    }

    #[test]
    fn duplicate_rows_do_not_duplicate_children() {
        let rows = vec![
            row(1, Some(10), Some((2, "Drama"))),
            row(1, Some(10), Some((2, "Drama"))),
            row(1, Some(10), Some((2, "Drama"))),
        ];
        let films = fold_film_rows(rows).unwrap();
        assert_eq!(films[0].likes.len(), 1);
        assert_eq!(films[0].genres.len(), 1);
    }

    #[test]
    fn film_without_likes_or_genres_appears_once() {
        let films = fold_film_rows(vec![row(5, None, None)]).unwrap();
        assert_eq!(films.len(), 1);
        assert!(films[0].likes.is_empty());
        assert!(films[0].genres.is_empty());
    }

    #[test]
    fn zero_ids_are_treated_as_absent() {
        let films = fold_film_rows(vec![row(5, Some(0), Some((0, "")))]).unwrap();
        assert!(films[0].likes.is_empty());
        assert!(films[0].genres.is_empty());
    }

    #[test]
    fn groups_non_contiguous_rows_in_first_seen_order() {
        let rows = vec![
            row(2, Some(1), None),
            row(1, None, Some((3, "Cartoon"))),
            row(2, Some(2), None),
            row(1, None, Some((1, "Comedy"))),
        ];
        let films = fold_film_rows(rows).unwrap();
        assert_eq!(films.iter().map(|f| f.id).collect::<Vec<_>>(), vec![Some(2), Some(1)]);
        assert_eq!(films[0].likes.len(), 2);
        assert_eq!(films[1].genres.iter().map(|g| g.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[test]
    fn calls_do_not_share_state() {
        let first = fold_film_rows(vec![row(1, Some(10), None)]).unwrap();
        let second = fold_film_rows(vec![row(1, Some(20), None)]).unwrap();
        assert_eq!(first[0].likes.iter().copied().collect::<Vec<_>>(), vec![10]);
        assert_eq!(second[0].likes.iter().copied().collect::<Vec<_>>(), vec![20]);
    }

    #[test]
    fn empty_input_yields_no_films() {
        assert!(fold_film_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn unparseable_release_date_is_an_error() {
        let mut bad = row(1, None, None);
        bad.release_date = "12.01.1991".to_string();
        assert!(matches!(fold_film_rows(vec![bad]), Err(AppError::Date(_))));
    }
}
