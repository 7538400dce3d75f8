//! User Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::User;

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let record = parse_record_id(USER_TABLE, id)?;
        let user: Option<User> = self.base.db().select(record).await?;
        Ok(user)
    }

    /// Find user by exact display name
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<User>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE name = $name LIMIT 1")
            .bind(("name", name.to_string()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a user. The unique index on `name` backstops races between
    /// concurrent logins under the same name.
    pub async fn create(&self, name: &str) -> RepoResult<User> {
        let mut result = self
            .base
            .db()
            .query("CREATE user SET name = $name, created_at = $now")
            .bind(("name", name.to_string()))
            .bind(("now", shared::util::now_millis()))
            .await?;
        let users: Vec<User> = result.take(0)?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Find-or-create by exact name (idempotent login upsert). A create
    /// that loses an index race falls back to re-reading the winner.
    pub async fn upsert_by_name(&self, name: &str) -> RepoResult<User> {
        if let Some(user) = self.find_by_name(name).await? {
            return Ok(user);
        }
        match self.create(name).await {
            Ok(user) => Ok(user),
            Err(RepoError::Database(_)) => self
                .find_by_name(name)
                .await?
                .ok_or_else(|| RepoError::Database("Failed to upsert user".to_string())),
            Err(e) => Err(e),
        }
    }
}
