//! 服务层结果对象
//!
//! 业务拒绝作为结果值返回，调用方通过 `rejection` 区分原因

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Rejection;
use crate::models::{
    Award, BadgeDefinition, BadgeSummary, Kudo, KudoDirection, LeaderboardEntry, LeaderboardKind,
    UserRecord,
};

/// 发放结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResult {
    pub awarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<BadgeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl AwardResult {
    pub fn awarded(badge: Option<BadgeSummary>, reason: impl Into<String>) -> Self {
        Self {
            awarded: true,
            badge,
            reason: Some(reason.into()),
            rejection: None,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            awarded: false,
            badge: None,
            reason: Some(rejection.to_string()),
            rejection: Some(rejection),
        }
    }
}

/// 撤销结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl RevokeResult {
    pub fn revoked(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            rejection: None,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            success: false,
            message: rejection.to_string(),
            rejection: Some(rejection),
        }
    }
}

/// 未持有徽章的进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgress {
    pub badge: BadgeSummary,
    pub progress: i64,
    pub target: i64,
    /// 0..=99
    pub percentage: u8,
}

/// 同伴徽章限额状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAwardStatus {
    pub remaining: u32,
    pub max_per_year: u32,
    pub year: i32,
    pub message: String,
}

/// 用户持有的徽章（定义 + 持有信息）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldBadge {
    pub badge: BadgeDefinition,
    pub awarded_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub awarded_at: DateTime<Utc>,
}

impl HeldBadge {
    pub fn new(badge: BadgeDefinition, award: Award) -> Self {
        Self {
            badge,
            awarded_by: award.awarded_by,
            reason: award.reason,
            awarded_at: award.awarded_at,
        }
    }
}

/// 记录感谢的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KudoOutcome {
    pub kudo: Kudo,
    /// 因本次感谢新获得的徽章（接收人与发送人）
    pub new_badges: Vec<AwardResult>,
}

/// 附带双方用户信息的感谢
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KudoView {
    #[serde(flatten)]
    pub kudo: Kudo,
    pub from: UserRecord,
    pub to: UserRecord,
}

/// 感谢动态（分页）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KudoFeed {
    pub kudos: Vec<KudoView>,
    /// 本页已满时为最后一条的 id
    pub next_cursor: Option<i64>,
}

/// 用户的感谢计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KudoStats {
    pub received: i64,
    pub sent: i64,
}

/// 用户的感谢列表
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKudos {
    pub user: UserRecord,
    #[serde(rename = "type")]
    pub direction: KudoDirection,
    pub kudos: Vec<KudoView>,
    pub stats: KudoStats,
}

/// 排行榜
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    #[serde(rename = "type")]
    pub kind: LeaderboardKind,
    pub leaderboard: Vec<LeaderboardEntry>,
}
