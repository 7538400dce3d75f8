//! Counting Session Repository
//!
//! Includes the login gate: resume the user's active session when one
//! exists, otherwise create user and session as one reported unit.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, UserRepository, parse_record_id};
use crate::db::models::{
    CountingSession, SESSION_STATUS_ACTIVE, SESSION_STATUS_COMPLETED, SessionWithUser,
};
use shared::SessionSummary;

const SESSION_TABLE: &str = "counting_session";

const SESSION_WITH_USER_FIELDS: &str = "id, user.name AS user_name, status, started_at, \
     ended_at, total_items_counted, total_units_counted";

/// Optional filters for the master session listing
#[derive(Debug, Default, Clone)]
pub struct SessionFilter {
    pub status: Option<String>,
    /// Inclusive lower bound on started_at (millis)
    pub started_from: Option<i64>,
    /// Exclusive upper bound on started_at (millis)
    pub started_until: Option<i64>,
}

/// Outcome of the login gate
#[derive(Debug, Clone)]
pub struct OpenedSession {
    pub session: CountingSession,
    /// True when an existing active session was resumed
    pub resumed: bool,
}

#[derive(Clone)]
pub struct SessionRepository {
    base: BaseRepository,
}

impl SessionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Login gate: upsert the user by exact name, then resume their most
    /// recent active session or start a new one.
    ///
    /// Either step failing fails the login as a whole; the caller reports
    /// it and retries. A user row without a session is never silently
    /// treated as logged in.
    pub async fn open_for_user(&self, name: &str) -> RepoResult<OpenedSession> {
        let users = UserRepository::new(self.base.db().clone());
        let user = users.upsert_by_name(name).await?;
        let user_id = user
            .id
            .ok_or_else(|| RepoError::Database("User row missing id".to_string()))?;

        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM counting_session \
                 WHERE user = $user AND status = $status \
                 ORDER BY started_at DESC LIMIT 1",
            )
            .bind(("user", user_id.clone()))
            .bind(("status", SESSION_STATUS_ACTIVE))
            .await?;
        let active: Vec<CountingSession> = result.take(0)?;

        if let Some(session) = active.into_iter().next() {
            tracing::info!(user = %name, session = ?session.id, "Resuming active session");
            return Ok(OpenedSession {
                session,
                resumed: true,
            });
        }

        let mut result = self
            .base
            .db()
            .query(
                "CREATE counting_session SET \
                 user = $user, status = $status, started_at = $now, \
                 total_items_counted = 0, total_units_counted = 0",
            )
            .bind(("user", user_id))
            .bind(("status", SESSION_STATUS_ACTIVE))
            .bind(("now", shared::util::now_millis()))
            .await?;
        let created: Vec<CountingSession> = result.take(0)?;
        let session = created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create session".to_string()))?;

        tracing::info!(user = %name, session = ?session.id, "Started new session");
        Ok(OpenedSession {
            session,
            resumed: false,
        })
    }

    /// Find session by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<CountingSession>> {
        let record = parse_record_id(SESSION_TABLE, id)?;
        let session: Option<CountingSession> = self.base.db().select(record).await?;
        Ok(session)
    }

    /// Find session by id, requiring it to still be active
    pub async fn find_active_by_id(&self, id: &str) -> RepoResult<CountingSession> {
        let session = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Session {} not found", id)))?;
        if session.status != SESSION_STATUS_ACTIVE {
            return Err(RepoError::Validation(format!(
                "Session {} is already completed",
                id
            )));
        }
        Ok(session)
    }

    /// All sessions with the owner's name joined, newest first
    pub async fn find_all_with_user(&self, filter: SessionFilter) -> RepoResult<Vec<SessionWithUser>> {
        let mut conditions = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.started_from.is_some() {
            conditions.push("started_at >= $from");
        }
        if filter.started_until.is_some() {
            conditions.push("started_at < $until");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };

        let query_str = format!(
            "SELECT {SESSION_WITH_USER_FIELDS} FROM counting_session {where_clause}ORDER BY started_at DESC"
        );

        let mut query = self.base.db().query(query_str);
        if let Some(status) = filter.status {
            query = query.bind(("status", status));
        }
        if let Some(from) = filter.started_from {
            query = query.bind(("from", from));
        }
        if let Some(until) = filter.started_until {
            query = query.bind(("until", until));
        }

        let sessions: Vec<SessionWithUser> = query.await?.take(0)?;
        Ok(sessions)
    }

    /// Active sessions only (master telemetry panel)
    pub async fn find_active_with_user(&self) -> RepoResult<Vec<SessionWithUser>> {
        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT {SESSION_WITH_USER_FIELDS} FROM counting_session \
                 WHERE status = $status ORDER BY started_at DESC"
            ))
            .bind(("status", SESSION_STATUS_ACTIVE))
            .await?;
        let sessions: Vec<SessionWithUser> = result.take(0)?;
        Ok(sessions)
    }

    /// Session summaries for the counter-performance analysis
    pub async fn summaries(&self) -> RepoResult<Vec<SessionSummary>> {
        #[derive(Deserialize)]
        struct Row {
            user_name: String,
            total_items_counted: i64,
            total_units_counted: f64,
            started_at: i64,
            #[serde(default)]
            ended_at: Option<i64>,
        }

        let mut result = self
            .base
            .db()
            .query(
                "SELECT user.name AS user_name, total_items_counted, total_units_counted, \
                 started_at, ended_at FROM counting_session",
            )
            .await?;
        let rows: Vec<Row> = result.take(0)?;
        Ok(rows
            .into_iter()
            .map(|r| SessionSummary {
                user_name: r.user_name,
                total_items: r.total_items_counted,
                total_units: r.total_units_counted,
                started_at: r.started_at,
                ended_at: r.ended_at,
            })
            .collect())
    }

    /// Record ids of sessions started inside the given bounds (both
    /// optional); used to scope the consolidated report.
    pub async fn ids_started_between(
        &self,
        from: Option<i64>,
        until: Option<i64>,
    ) -> RepoResult<Vec<surrealdb::RecordId>> {
        #[derive(Deserialize)]
        struct Row {
            #[serde(with = "crate::db::models::serde_helpers::record_id")]
            id: surrealdb::RecordId,
        }

        let mut conditions = Vec::new();
        if from.is_some() {
            conditions.push("started_at >= $from");
        }
        if until.is_some() {
            conditions.push("started_at < $until");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };

        let mut query = self
            .base
            .db()
            .query(format!("SELECT id FROM counting_session {where_clause}"));
        if let Some(from) = from {
            query = query.bind(("from", from));
        }
        if let Some(until) = until {
            query = query.bind(("until", until));
        }

        let rows: Vec<Row> = query.await?.take(0)?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    /// Finalize an active session. Completing twice reports "not found or
    /// already completed" rather than silently succeeding.
    pub async fn finalize(&self, id: &str) -> RepoResult<CountingSession> {
        let record = parse_record_id(SESSION_TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE counting_session SET status = $completed, ended_at = $now \
                 WHERE id = $id AND status = $active RETURN AFTER",
            )
            .bind(("id", record))
            .bind(("completed", SESSION_STATUS_COMPLETED))
            .bind(("active", SESSION_STATUS_ACTIVE))
            .bind(("now", shared::util::now_millis()))
            .await?;
        let sessions: Vec<CountingSession> = result.take(0)?;
        sessions.into_iter().next().ok_or_else(|| {
            RepoError::NotFound(format!("Session {} not found or already completed", id))
        })
    }
}
