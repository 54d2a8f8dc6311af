//! 徽章持有仓储
//!
//! (user_id, badge_id) 上的唯一约束是并发评估下"一次性发放"的最终保障。

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::AwardRepositoryTrait;
use crate::error::Result;
use crate::models::{Award, InsertOutcome, NewAward};

/// 徽章持有仓储
pub struct AwardRepository {
    pool: PgPool,
}

impl AwardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 获取用户的某个徽章记录
    pub async fn find_award(&self, user_id: i64, badge_id: i64) -> Result<Option<Award>> {
        let award = sqlx::query_as::<_, Award>(
            r#"
            SELECT id, user_id, badge_id, awarded_by, reason, awarded_at
            FROM user_badges
            WHERE user_id = $1 AND badge_id = $2
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(award)
    }

    /// 列出用户的所有徽章（最近发放在前）
    pub async fn list_awards(&self, user_id: i64) -> Result<Vec<Award>> {
        let awards = sqlx::query_as::<_, Award>(
            r#"
            SELECT id, user_id, badge_id, awarded_by, reason, awarded_at
            FROM user_badges
            WHERE user_id = $1
            ORDER BY awarded_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(awards)
    }

    // ==================== 写入操作 ====================

    /// 条件写入，冲突时不报错
    pub async fn insert_if_absent(&self, award: &NewAward) -> Result<InsertOutcome> {
        let inserted = sqlx::query_as::<_, Award>(
            r#"
            INSERT INTO user_badges (user_id, badge_id, awarded_by, reason, awarded_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            RETURNING id, user_id, badge_id, awarded_by, reason, awarded_at
            "#,
        )
        .bind(award.user_id)
        .bind(award.badge_id)
        .bind(&award.awarded_by)
        .bind(&award.reason)
        .bind(award.awarded_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(award) => InsertOutcome::Inserted(award),
            None => InsertOutcome::AlreadyExists,
        })
    }

    /// 撤销：物理删除
    pub async fn delete_award(&self, user_id: i64, badge_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_badges WHERE user_id = $1 AND badge_id = $2")
            .bind(user_id)
            .bind(badge_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AwardRepositoryTrait for AwardRepository {
    async fn find_award(&self, user_id: i64, badge_id: i64) -> Result<Option<Award>> {
        self.find_award(user_id, badge_id).await
    }

    async fn list_awards(&self, user_id: i64) -> Result<Vec<Award>> {
        self.list_awards(user_id).await
    }

    async fn insert_if_absent(&self, award: &NewAward) -> Result<InsertOutcome> {
        self.insert_if_absent(award).await
    }

    async fn delete_award(&self, user_id: i64, badge_id: i64) -> Result<bool> {
        self.delete_award(user_id, badge_id).await
    }
}
