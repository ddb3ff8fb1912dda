use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageBackend {
    Memory,
    Database,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "database" | "db" => Ok(StorageBackend::Database),
            other => anyhow::bail!("unknown storage backend {other:?}"),
        }
    }
}

/// How `PUT /users/{id}/friends/{friendId}` is recorded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FriendshipMode {
    /// One edge from the requesting user to the friend.
    #[default]
    Directed,
    /// Edges in both directions, added and removed together.
    Mutual,
}

impl FromStr for FriendshipMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directed" => Ok(FriendshipMode::Directed),
            "mutual" | "symmetric" => Ok(FriendshipMode::Mutual),
            other => anyhow::bail!("unknown friendship mode {other:?}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub storage: StorageBackend,
    pub database_url: String,
    pub database_max_connections: u32,
    pub friendship_mode: FriendshipMode,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("PORT")?;

        let storage: StorageBackend = std::env::var("STORAGE")
            .unwrap_or_else(|_| "database".to_string())
            .parse()
            .context("STORAGE")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://filmrate.db?mode=rwc".to_string());

        let database_max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let friendship_mode: FriendshipMode = match std::env::var("FRIENDSHIP_MODE") {
            Ok(s) => s.parse().context("FRIENDSHIP_MODE")?,
            Err(_) => FriendshipMode::default(),
        };

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            storage,
            database_url,
            database_max_connections,
            friendship_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_names() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(" Database ".parse::<StorageBackend>().unwrap(), StorageBackend::Database);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn parses_friendship_modes() {
        assert_eq!("directed".parse::<FriendshipMode>().unwrap(), FriendshipMode::Directed);
        assert_eq!("MUTUAL".parse::<FriendshipMode>().unwrap(), FriendshipMode::Mutual);
        assert!("both".parse::<FriendshipMode>().is_err());
        assert_eq!(FriendshipMode::default(), FriendshipMode::Directed);
    }
}
