//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Award, BadgeDefinition, InsertOutcome, Kudo, KudoDirection, LeaderboardEntry,
    LeaderboardKind, NewAward, NewBadgeDefinition, NewKudo, NewPeerGrant, PeerGrantInsert,
    TriggerKind, UserCounters, UserRecord,
};

/// 徽章目录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeRepositoryTrait: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BadgeDefinition>>;
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<BadgeDefinition>>;
    async fn list_active(&self) -> Result<Vec<BadgeDefinition>>;

    /// 用户尚未持有的启用中非手动徽章，可按触发类型收窄
    async fn list_unheld_automatic(
        &self,
        user_id: i64,
        kind: Option<TriggerKind>,
    ) -> Result<Vec<BadgeDefinition>>;

    /// 按 slug 新增或更新
    async fn upsert(&self, badge: &NewBadgeDefinition) -> Result<BadgeDefinition>;
}

/// 徽章持有仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AwardRepositoryTrait: Send + Sync {
    async fn find_award(&self, user_id: i64, badge_id: i64) -> Result<Option<Award>>;
    async fn list_awards(&self, user_id: i64) -> Result<Vec<Award>>;

    /// 条件写入：(user_id, badge_id) 已存在时返回 `AlreadyExists`
    async fn insert_if_absent(&self, award: &NewAward) -> Result<InsertOutcome>;

    /// 物理删除，返回是否删除了记录
    async fn delete_award(&self, user_id: i64, badge_id: i64) -> Result<bool>;
}

/// 计数器仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterRepositoryTrait: Send + Sync {
    /// 以 `now` 为基准计算入职天数与连续活跃天数
    async fn fetch_counters(&self, user_id: i64, now: DateTime<Utc>) -> Result<UserCounters>;
}

/// 同伴徽章发放记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeerGrantRepositoryTrait: Send + Sync {
    async fn count_grants_in_year(&self, from_user_id: i64, year: i32) -> Result<u32>;

    /// 在发放人维度的临界区内复核限额并写入
    async fn record_grant_within_quota(
        &self,
        grant: &NewPeerGrant,
        quota: u32,
    ) -> Result<PeerGrantInsert>;
}

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>>;

    /// 用户名大小写不敏感匹配
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>>;

    /// 按计数降序排名，计数相同按用户 id 升序；没有记录的用户计为 0
    async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>>;
}

/// 感谢记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KudoRepositoryTrait: Send + Sync {
    async fn create(&self, kudo: &NewKudo) -> Result<Kudo>;

    /// 公开感谢，按时间倒序
    ///
    /// `before` 为上一页最后一条的 id，不存在时返回空列表
    async fn list_public(&self, limit: u32, before: Option<i64>) -> Result<Vec<Kudo>>;

    /// 与用户相关的感谢，按时间倒序
    async fn list_for_user(
        &self,
        user_id: i64,
        direction: KudoDirection,
        include_private: bool,
        limit: u32,
    ) -> Result<Vec<Kudo>>;
}
