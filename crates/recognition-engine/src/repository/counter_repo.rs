//! 计数器仓储
//!
//! 从感谢、GitHub 统计、同伴徽章与徽章持有记录聚合出计数器快照。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::CounterRepositoryTrait;
use crate::error::Result;
use crate::models::{STREAK_LOOKBACK, UserCounters, streak_days, tenure_days};

/// 聚合查询结果
#[derive(sqlx::FromRow)]
struct CounterRow {
    created_at: DateTime<Utc>,
    kudos_received: i64,
    kudos_sent: i64,
    peer_awards_received: i64,
    peer_awards_given: i64,
    total_badges: i64,
    commits: i64,
    pull_requests: i64,
    reviews: i64,
    issues_closed: i64,
}

/// 计数器仓储
pub struct CounterRepository {
    pool: PgPool,
}

impl CounterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 计算用户计数器快照；用户不存在时全部为 0
    pub async fn fetch_counters(&self, user_id: i64, now: DateTime<Utc>) -> Result<UserCounters> {
        let row = sqlx::query_as::<_, CounterRow>(
            r#"
            SELECT
                u.created_at,
                (SELECT COUNT(*) FROM kudos WHERE to_user_id = u.id) AS kudos_received,
                (SELECT COUNT(*) FROM kudos WHERE from_user_id = u.id) AS kudos_sent,
                (SELECT COUNT(*) FROM peer_award_grants WHERE to_user_id = u.id) AS peer_awards_received,
                (SELECT COUNT(*) FROM peer_award_grants WHERE from_user_id = u.id) AS peer_awards_given,
                (SELECT COUNT(*) FROM user_badges WHERE user_id = u.id) AS total_badges,
                COALESCE(gs.commits, 0)::BIGINT AS commits,
                COALESCE(gs.pull_requests, 0)::BIGINT AS pull_requests,
                COALESCE(gs.reviews, 0)::BIGINT AS reviews,
                COALESCE(gs.issues_closed, 0)::BIGINT AS issues_closed
            FROM users u
            LEFT JOIN github_stats gs ON gs.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(UserCounters::default());
        };

        let activity: Vec<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT awarded_at FROM user_badges
            WHERE user_id = $1
            ORDER BY awarded_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(STREAK_LOOKBACK as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserCounters {
            kudos_received: row.kudos_received,
            kudos_sent: row.kudos_sent,
            code_reviews: row.reviews,
            pull_requests: row.pull_requests,
            issues_closed: row.issues_closed,
            streak_days: streak_days(&activity, now),
            tenure_days: tenure_days(row.created_at, now),
            github_commits: row.commits,
            github_prs: row.pull_requests,
            github_reviews: row.reviews,
            peer_awards_received: row.peer_awards_received,
            peer_awards_given: row.peer_awards_given,
            total_badges: row.total_badges,
        })
    }
}

#[async_trait]
impl CounterRepositoryTrait for CounterRepository {
    async fn fetch_counters(&self, user_id: i64, now: DateTime<Utc>) -> Result<UserCounters> {
        self.fetch_counters(user_id, now).await
    }
}
