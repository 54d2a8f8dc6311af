//! 徽章目录仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::BadgeRepositoryTrait;
use crate::error::Result;
use crate::models::{BadgeDefinition, NewBadgeDefinition, TriggerKind};

const BADGE_COLUMNS: &str = "id, slug, name, description, tier, category, trigger_kind, threshold, is_active, created_at";

/// 徽章目录仓储
pub struct BadgeRepository {
    pool: PgPool,
}

impl BadgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 按 slug 获取徽章
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<BadgeDefinition>> {
        let badge = sqlx::query_as::<_, BadgeDefinition>(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(badge)
    }

    /// 批量获取徽章
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<BadgeDefinition>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let badges = sqlx::query_as::<_, BadgeDefinition>(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    /// 启用中的全部徽章
    pub async fn list_active(&self) -> Result<Vec<BadgeDefinition>> {
        let badges = sqlx::query_as::<_, BadgeDefinition>(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges WHERE is_active = TRUE ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    /// 用户尚未持有的启用中非手动徽章
    ///
    /// 差集在评估前一次性算出。
    pub async fn list_unheld_automatic(
        &self,
        user_id: i64,
        kind: Option<TriggerKind>,
    ) -> Result<Vec<BadgeDefinition>> {
        let badges = sqlx::query_as::<_, BadgeDefinition>(&format!(
            r#"
            SELECT {BADGE_COLUMNS}
            FROM badges b
            WHERE b.is_active = TRUE
              AND b.trigger_kind <> 'MANUAL'
              AND ($2::VARCHAR IS NULL OR b.trigger_kind = $2)
              AND NOT EXISTS (
                  SELECT 1 FROM user_badges ub
                  WHERE ub.user_id = $1 AND ub.badge_id = b.id
              )
            ORDER BY b.id
            "#
        ))
        .bind(user_id)
        .bind(kind.map(String::from))
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    // ==================== 写入操作 ====================

    /// 按 slug 新增或更新
    pub async fn upsert(&self, badge: &NewBadgeDefinition) -> Result<BadgeDefinition> {
        let saved = sqlx::query_as::<_, BadgeDefinition>(&format!(
            r#"
            INSERT INTO badges (slug, name, description, tier, category, trigger_kind, threshold, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                tier = EXCLUDED.tier,
                category = EXCLUDED.category,
                trigger_kind = EXCLUDED.trigger_kind,
                threshold = EXCLUDED.threshold,
                is_active = EXCLUDED.is_active
            RETURNING {BADGE_COLUMNS}
            "#
        ))
        .bind(&badge.slug)
        .bind(&badge.name)
        .bind(&badge.description)
        .bind(badge.tier)
        .bind(&badge.category)
        .bind(badge.trigger_kind.as_str())
        .bind(badge.threshold)
        .bind(badge.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}

#[async_trait]
impl BadgeRepositoryTrait for BadgeRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BadgeDefinition>> {
        self.find_by_slug(slug).await
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<BadgeDefinition>> {
        self.find_by_ids(ids).await
    }

    async fn list_active(&self) -> Result<Vec<BadgeDefinition>> {
        self.list_active().await
    }

    async fn list_unheld_automatic(
        &self,
        user_id: i64,
        kind: Option<TriggerKind>,
    ) -> Result<Vec<BadgeDefinition>> {
        self.list_unheld_automatic(user_id, kind).await
    }

    async fn upsert(&self, badge: &NewBadgeDefinition) -> Result<BadgeDefinition> {
        self.upsert(badge).await
    }
}
