//! 用户与感谢（kudo）模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// 展示名，缺失时回退为用户名
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// 感谢记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Kudo {
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub message: String,
    pub category: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// 排行榜条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 从 1 开始
    pub rank: u32,
    pub user: UserRecord,
    pub count: i64,
}

impl LeaderboardEntry {
    /// 按已排好的顺序编号
    pub fn ranked(rows: impl IntoIterator<Item = (UserRecord, i64)>) -> Vec<Self> {
        rows.into_iter()
            .enumerate()
            .map(|(i, (user, count))| Self {
                rank: u32::try_from(i + 1).unwrap_or(u32::MAX),
                user,
                count,
            })
            .collect()
    }
}

/// 待写入的感谢记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKudo {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub message: String,
    pub category: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// GitHub 活动统计（由外部同步写入）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GithubStats {
    pub commits: i64,
    pub pull_requests: i64,
    pub reviews: i64,
    pub issues_closed: i64,
}
