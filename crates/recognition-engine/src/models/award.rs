//! 徽章持有与同伴徽章发放记录模型

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// 系统自动发放时使用的发放人标记
pub const SYSTEM_ACTOR: &str = "system";

/// 用户持有的徽章
///
/// 每个 (user_id, badge_id) 至多一条；只会被撤销删除，从不更新。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub id: i64,
    pub user_id: i64,
    pub badge_id: i64,
    /// 发放人用户名，或 `system`
    pub awarded_by: String,
    pub reason: Option<String>,
    pub awarded_at: DateTime<Utc>,
}

/// 待写入的徽章持有记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAward {
    pub user_id: i64,
    pub badge_id: i64,
    pub awarded_by: String,
    pub reason: Option<String>,
    pub awarded_at: DateTime<Utc>,
}

/// 条件写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Award),
    /// 唯一约束冲突，视为已发放
    AlreadyExists,
}

/// 同伴徽章发放记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PeerGrant {
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub message: String,
    pub granted_at: DateTime<Utc>,
}

/// 待写入的同伴徽章发放记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeerGrant {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub message: String,
    pub granted_at: DateTime<Utc>,
}

impl NewPeerGrant {
    /// 限额窗口所属自然年（UTC）
    pub fn year(&self) -> i32 {
        self.granted_at.year()
    }
}

/// 限额内写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerGrantInsert {
    Recorded(PeerGrant),
    /// 临界区内复核时限额已用尽
    QuotaExhausted { used: u32 },
}

/// 自然年（UTC）的 [start, end) 区间
pub fn year_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single()?;
    Some((start, end))
}
