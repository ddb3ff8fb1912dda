use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::{
    config::FriendshipMode,
    error::{AppError, AppResult},
    models::User,
    storage::{Storage, UserStore},
    validation::prepare_user,
};

#[derive(Clone)]
pub struct UserService {
    storage: Storage,
    friendship: FriendshipMode,
}

impl UserService {
    pub fn new(storage: Storage, friendship: FriendshipMode) -> Self {
        Self { storage, friendship }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.storage.list_users().await
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        self.storage.get_user(id).await?.ok_or_else(|| user_not_found(id))
    }

    pub async fn create(&self, user: User) -> AppResult<User> {
        let user = prepare_user(user, today())?;
        let user = self.storage.create_user(user).await?;
        info!(user_id = ?user.id, login = %user.login, "user created");
        Ok(user)
    }

    pub async fn update(&self, user: User) -> AppResult<User> {
        let Some(id) = user.id else {
            return Err(AppError::validation("id required"));
        };
        self.get(id).await?;
        let user = prepare_user(user, today())?;
        let user = self.storage.update_user(id, user).await?.ok_or_else(|| user_not_found(id))?;
        info!(user_id = id, login = %user.login, "user updated");
        Ok(user)
    }

    pub async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        self.ensure_pair(user_id, friend_id).await?;
        match self.friendship {
            FriendshipMode::Directed => self.storage.add_friend(user_id, friend_id).await?,
            FriendshipMode::Mutual => self.storage.add_mutual_friends(user_id, friend_id).await?,
        }
        debug!(user_id, friend_id, mode = ?self.friendship, "friend added");
        Ok(())
    }

    pub async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        self.ensure_pair(user_id, friend_id).await?;
        match self.friendship {
            FriendshipMode::Directed => self.storage.remove_friend(user_id, friend_id).await?,
            FriendshipMode::Mutual => {
                self.storage.remove_mutual_friends(user_id, friend_id).await?
            },
        }
        debug!(user_id, friend_id, mode = ?self.friendship, "friend removed");
        Ok(())
    }

    pub async fn friends(&self, user_id: i64) -> AppResult<Vec<User>> {
        self.get(user_id).await?;
        self.storage.friends_of(user_id).await
    }

    /// Users both `user_id` and `other_id` list as friends, ascending by id.
    /// Symmetric in its arguments; empty when the friend sets do not overlap.
    pub async fn common_friends(&self, user_id: i64, other_id: i64) -> AppResult<Vec<User>> {
        let user = self.get(user_id).await?;
        let other = self.get(other_id).await?;

        let common: BTreeSet<i64> = user.friends.intersection(&other.friends).copied().collect();
        let mut out = Vec::with_capacity(common.len());
        for id in common {
            if let Some(friend) = self.storage.get_user(id).await? {
                out.push(friend);
            }
        }
        debug!(user_id, other_id, common = out.len(), "common friends");
        Ok(out)
    }

    async fn ensure_pair(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        if user_id == friend_id {
            return Err(AppError::validation("a user cannot befriend themselves"));
        }
        self.get(user_id).await?;
        self.get(friend_id).await?;
        Ok(())
    }
}

fn today() -> jiff::civil::Date {
    jiff::Zoned::now().date()
}

fn user_not_found(id: i64) -> AppError {
    AppError::not_found(format!("user {id} not found"))
}
