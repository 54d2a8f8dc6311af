//! 同伴徽章发放记录仓储
//!
//! 限额复核与写入在同一事务中进行，并以发放人 ID 为键持有事务级 advisory lock，
//! 同一发放人的并发请求在此串行化。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::traits::PeerGrantRepositoryTrait;
use crate::error::{EngineError, Result};
use crate::models::{NewPeerGrant, PeerGrant, PeerGrantInsert, year_bounds};

/// 同伴徽章发放记录仓储
pub struct PeerGrantRepository {
    pool: PgPool,
}

impl PeerGrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        year_bounds(year).ok_or_else(|| EngineError::Internal(format!("无效的年份: {year}")))
    }

    async fn count_in_window(
        conn: &mut PgConnection,
        from_user_id: i64,
        year: i32,
    ) -> Result<u32> {
        let (start, end) = Self::bounds(year)?;
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM peer_award_grants
            WHERE from_user_id = $1 AND granted_at >= $2 AND granted_at < $3
            "#,
        )
        .bind(from_user_id)
        .bind(start)
        .bind(end)
        .fetch_one(conn)
        .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// 统计发放人在某自然年内的发放次数
    pub async fn count_grants_in_year(&self, from_user_id: i64, year: i32) -> Result<u32> {
        let mut conn = self.pool.acquire().await?;
        Self::count_in_window(&mut *conn, from_user_id, year).await
    }

    /// 限额内写入
    pub async fn record_grant_within_quota(
        &self,
        grant: &NewPeerGrant,
        quota: u32,
    ) -> Result<PeerGrantInsert> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(grant.from_user_id)
            .execute(&mut *tx)
            .await?;

        let used = Self::count_in_window(&mut *tx, grant.from_user_id, grant.year()).await?;
        if used >= quota {
            tx.rollback().await?;
            return Ok(PeerGrantInsert::QuotaExhausted { used });
        }

        let recorded = sqlx::query_as::<_, PeerGrant>(
            r#"
            INSERT INTO peer_award_grants (from_user_id, to_user_id, message, granted_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, from_user_id, to_user_id, message, granted_at
            "#,
        )
        .bind(grant.from_user_id)
        .bind(grant.to_user_id)
        .bind(&grant.message)
        .bind(grant.granted_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PeerGrantInsert::Recorded(recorded))
    }
}

#[async_trait]
impl PeerGrantRepositoryTrait for PeerGrantRepository {
    async fn count_grants_in_year(&self, from_user_id: i64, year: i32) -> Result<u32> {
        self.count_grants_in_year(from_user_id, year).await
    }

    async fn record_grant_within_quota(
        &self,
        grant: &NewPeerGrant,
        quota: u32,
    ) -> Result<PeerGrantInsert> {
        self.record_grant_within_quota(grant, quota).await
    }
}
