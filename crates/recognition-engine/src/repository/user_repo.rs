//! 用户与感谢记录仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::{KudoRepositoryTrait, UserRepositoryTrait};
use crate::error::Result;
use crate::models::{Kudo, KudoDirection, LeaderboardEntry, LeaderboardKind, NewKudo, UserRecord};

const KUDO_COLUMNS: &str = "id, from_user_id, to_user_id, message, category, is_public, created_at";

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    id: i64,
    username: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    count: i64,
}

impl LeaderboardRow {
    fn into_parts(self) -> (UserRecord, i64) {
        (
            UserRecord {
                id: self.id,
                username: self.username,
                display_name: self.display_name,
                created_at: self.created_at,
            },
            self.count,
        )
    }
}

/// 排行榜统计的关联表与关联列
fn leaderboard_join(kind: LeaderboardKind) -> (&'static str, &'static str) {
    match kind {
        LeaderboardKind::Badges => ("user_badges", "user_id"),
        LeaderboardKind::KudosReceived => ("kudos", "to_user_id"),
        LeaderboardKind::KudosSent => ("kudos", "from_user_id"),
    }
}

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, display_name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, display_name, created_at
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, display_name, created_at FROM users WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>> {
        let (table, column) = leaderboard_join(kind);
        let rows = sqlx::query_as::<_, LeaderboardRow>(&format!(
            r#"
            SELECT u.id, u.username, u.display_name, u.created_at, COUNT(t.id) AS count
            FROM users u
            LEFT JOIN {table} t ON t.{column} = u.id
            GROUP BY u.id
            ORDER BY count DESC, u.id ASC
            LIMIT $1
            "#
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(LeaderboardEntry::ranked(
            rows.into_iter().map(LeaderboardRow::into_parts),
        ))
    }
}

/// 感谢记录仓储
pub struct KudoRepository {
    pool: PgPool,
}

impl KudoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KudoRepositoryTrait for KudoRepository {
    async fn create(&self, kudo: &NewKudo) -> Result<Kudo> {
        let saved = sqlx::query_as::<_, Kudo>(
            r#"
            INSERT INTO kudos (from_user_id, to_user_id, message, category, is_public, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, from_user_id, to_user_id, message, category, is_public, created_at
            "#,
        )
        .bind(kudo.from_user_id)
        .bind(kudo.to_user_id)
        .bind(&kudo.message)
        .bind(&kudo.category)
        .bind(kudo.is_public)
        .bind(kudo.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn list_public(&self, limit: u32, before: Option<i64>) -> Result<Vec<Kudo>> {
        let kudos = sqlx::query_as::<_, Kudo>(&format!(
            r#"
            SELECT {KUDO_COLUMNS}
            FROM kudos
            WHERE is_public
              AND ($2::BIGINT IS NULL
                   OR (created_at, id) < (SELECT created_at, id FROM kudos WHERE id = $2))
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#
        ))
        .bind(i64::from(limit))
        .bind(before)
        .fetch_all(&self.pool)
        .await?;

        Ok(kudos)
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        direction: KudoDirection,
        include_private: bool,
        limit: u32,
    ) -> Result<Vec<Kudo>> {
        let kudos = sqlx::query_as::<_, Kudo>(&format!(
            r#"
            SELECT {KUDO_COLUMNS}
            FROM kudos
            WHERE (($2 AND to_user_id = $1) OR ($3 AND from_user_id = $1))
              AND ($4 OR is_public)
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#
        ))
        .bind(user_id)
        .bind(direction.includes_received())
        .bind(direction.includes_sent())
        .bind(include_private)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(kudos)
    }
}
