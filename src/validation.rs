//! Field rules applied by the services before anything reaches storage.

use std::collections::HashSet;

use jiff::civil::Date;

use crate::{
    error::{AppError, AppResult},
    models::{Film, Genre, User},
};

pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Earliest accepted release date (the first public film screening).
pub const EARLIEST_RELEASE: Date = jiff::civil::date(1895, 12, 28);

pub fn validate_film(film: &Film) -> AppResult<()> {
    if film.name.trim().is_empty() {
        return Err(AppError::validation("film name must not be blank"));
    }
    if film.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::validation(format!(
            "film description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    if film.release_date < EARLIEST_RELEASE {
        return Err(AppError::validation(format!(
            "release date must not be earlier than {EARLIEST_RELEASE}"
        )));
    }
    if film.duration <= 0 {
        return Err(AppError::validation("film duration must be positive"));
    }
    Ok(())
}

/// Drops repeated genre ids, keeping the first occurrence in place.
pub fn dedup_genres(genres: Vec<Genre>) -> Vec<Genre> {
    let mut seen = HashSet::new();
    genres.into_iter().filter(|g| seen.insert(g.id)).collect()
}

pub fn validate_user(user: &User, today: Date) -> AppResult<()> {
    let email = user.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("email must be non-blank and contain '@'"));
    }
    if user.login.trim().is_empty() || user.login.chars().any(char::is_whitespace) {
        return Err(AppError::validation("login must be non-blank and contain no whitespace"));
    }
    if user.birthday > today {
        return Err(AppError::validation("birthday must not be in the future"));
    }
    Ok(())
}

pub fn normalize_login(login: &str) -> String {
    login.trim().replace(' ', "_")
}

/// Validates the user and applies the write-side normalization: login is
/// trimmed with inner spaces replaced by `_`, and an absent or blank display
/// name falls back to that login.
pub fn prepare_user(mut user: User, today: Date) -> AppResult<User> {
    validate_user(&user, today)?;
    user.login = normalize_login(&user.login);
    if user.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        user.name = Some(user.login.clone());
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use jiff::civil::date;

    use super::*;
    use crate::models::Mpa;

    fn film() -> Film {
        Film {
            id: None,
            name: "Nosferatu".to_string(),
            description: "A symphony of horror".to_string(),
            release_date: date(1922, 3, 4),
            duration: 94,
            likes: BTreeSet::new(),
            genres: vec![],
            mpa: Mpa { id: 1, name: String::new() },
        }
    }

    fn user() -> User {
        User {
            id: None,
            email: "mail@mail.ru".to_string(),
            login: "dolore".to_string(),
            name: None,
            birthday: date(1946, 8, 20),
            friends: BTreeSet::new(),
        }
    }

    #[test]
    fn accepts_valid_film() {
        assert!(validate_film(&film()).is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let f = Film { name: "   ".to_string(), ..film() };
        assert!(matches!(validate_film(&f), Err(AppError::Validation(_))));
    }

    #[test]
    fn description_limit_counts_characters() {
        let f = Film { description: "я".repeat(200), ..film() };
        assert!(validate_film(&f).is_ok());
        let f = Film { description: "a".repeat(201), ..film() };
        assert!(matches!(validate_film(&f), Err(AppError::Validation(_))));
    }

    #[test]
    fn release_date_boundary_is_inclusive() {
        let f = Film { release_date: date(1895, 12, 28), ..film() };
        assert!(validate_film(&f).is_ok());
        let f = Film { release_date: date(1895, 12, 27), ..film() };
        assert!(matches!(validate_film(&f), Err(AppError::Validation(_))));
    }

    #[test]
    fn duration_must_be_positive() {
        for duration in [0, -1] {
            let f = Film { duration, ..film() };
            assert!(matches!(validate_film(&f), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn dedup_genres_keeps_first_seen_order() {
        let genres = vec![
            Genre { id: 3, name: String::new() },
            Genre { id: 1, name: String::new() },
            Genre { id: 3, name: String::new() },
        ];
        let ids: Vec<i64> = dedup_genres(genres).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn rejects_bad_emails() {
        let today = date(2024, 6, 1);
        for email in ["", "   ", "mail.ru"] {
            let u = User { email: email.to_string(), ..user() };
            assert!(matches!(validate_user(&u, today), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn rejects_blank_or_spaced_logins() {
        let today = date(2024, 6, 1);
        for login in ["", " login2", "dol ore"] {
            let u = User { login: login.to_string(), ..user() };
            assert!(matches!(validate_user(&u, today), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn birthday_today_is_allowed_but_not_tomorrow() {
        let today = date(2024, 6, 1);
        let u = User { birthday: today, ..user() };
        assert!(validate_user(&u, today).is_ok());
        let u = User { birthday: date(2024, 6, 2), ..user() };
        assert!(matches!(validate_user(&u, today), Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_or_blank_name_defaults_to_login() {
        let today = date(2024, 6, 1);
        let prepared = prepare_user(user(), today).unwrap();
        assert_eq!(prepared.name.as_deref(), Some("dolore"));

        let blank = User { name: Some("  ".to_string()), ..user() };
        let prepared = prepare_user(blank, today).unwrap();
        assert_eq!(prepared.name.as_deref(), Some("dolore"));

        let named = User { name: Some("Nick".to_string()), ..user() };
        let prepared = prepare_user(named, today).unwrap();
        assert_eq!(prepared.name.as_deref(), Some("Nick"));
    }

    #[test]
    fn normalize_login_trims_and_joins_words() {
        assert_eq!(normalize_login("  john smith "), "john_smith");
        assert_eq!(normalize_login("plain"), "plain");
    }
}
