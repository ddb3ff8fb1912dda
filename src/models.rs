use std::collections::BTreeSet;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// Genre reference entry. Request payloads usually carry only the id; the name
/// is filled in from the reference table when the film is stored.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// MPA rating classification (G, PG, PG-13, ...).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Mpa {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: Date,
    pub duration: i32,
    #[serde(default)]
    pub likes: BTreeSet<i64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub mpa: Mpa,
}

impl Film {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    pub birthday: Date,
    #[serde(default)]
    pub friends: BTreeSet<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub count: Option<i64>,
}
