pub mod film;
pub mod film_genre;
pub mod friend;
pub mod genre;
pub mod like;
pub mod rating_mpa;
pub mod user;
