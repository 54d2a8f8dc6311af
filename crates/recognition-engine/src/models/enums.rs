//! 认可引擎枚举类型定义
//!
//! 所有枚举都支持数据库和 JSON（serde）序列化

use std::fmt;

use serde::{Deserialize, Serialize};

/// 触发类型
///
/// 决定徽章读取哪个计数器。目录数据中出现的未知类型保留原始字符串，
/// 评估时一律视为不满足。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerKind {
    /// 仅管理员手动发放
    Manual,
    /// 同伴徽章相关的手动类型（如年度用尽限额后授予）
    ManualPeerAward,
    KudosReceived,
    KudosSent,
    CodeReviews,
    PullRequests,
    IssuesClosed,
    StreakDays,
    TenureDays,
    BadgesCount,
    GithubCommit,
    GithubPr,
    GithubReview,
    /// 收到的同伴徽章数量
    PeerAwardsCount,
    /// 首次行为，由外部流程发放
    FirstAction,
    /// 赞助，由赞助流程发放
    Investment,
    /// 无法识别的类型
    Unknown(String),
}

impl TriggerKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manual => "MANUAL",
            Self::ManualPeerAward => "MANUAL_PEER_AWARD",
            Self::KudosReceived => "KUDOS_RECEIVED",
            Self::KudosSent => "KUDOS_SENT",
            Self::CodeReviews => "CODE_REVIEWS",
            Self::PullRequests => "PULL_REQUESTS",
            Self::IssuesClosed => "ISSUES_CLOSED",
            Self::StreakDays => "STREAK_DAYS",
            Self::TenureDays => "TENURE_DAYS",
            Self::BadgesCount => "BADGES_COUNT",
            Self::GithubCommit => "GITHUB_COMMIT",
            Self::GithubPr => "GITHUB_PR",
            Self::GithubReview => "GITHUB_REVIEW",
            Self::PeerAwardsCount => "PEER_AWARDS_COUNT",
            Self::FirstAction => "FIRST_ACTION",
            Self::Investment => "INVESTMENT",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    /// 是否为纯手动类型（自动评估永不发放）
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual)
    }
}

impl From<&str> for TriggerKind {
    fn from(value: &str) -> Self {
        match value {
            "MANUAL" => Self::Manual,
            "MANUAL_PEER_AWARD" => Self::ManualPeerAward,
            "KUDOS_RECEIVED" => Self::KudosReceived,
            "KUDOS_SENT" => Self::KudosSent,
            "CODE_REVIEWS" => Self::CodeReviews,
            "PULL_REQUESTS" => Self::PullRequests,
            "ISSUES_CLOSED" => Self::IssuesClosed,
            "STREAK_DAYS" => Self::StreakDays,
            "TENURE_DAYS" => Self::TenureDays,
            "BADGES_COUNT" => Self::BadgesCount,
            "GITHUB_COMMIT" => Self::GithubCommit,
            "GITHUB_PR" => Self::GithubPr,
            "GITHUB_REVIEW" => Self::GithubReview,
            "PEER_AWARDS_COUNT" => Self::PeerAwardsCount,
            "FIRST_ACTION" => Self::FirstAction,
            "INVESTMENT" => Self::Investment,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for TriggerKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<TriggerKind> for String {
    fn from(value: TriggerKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 徽章等级
///
/// 有序：BRONZE < SILVER < GOLD
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeTier {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl BadgeTier {
    /// 通知标题使用的等级图标
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Gold => "🥇",
            Self::Silver => "🥈",
            Self::Bronze => "🥉",
        }
    }
}

/// 赞助等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatronTier {
    Seed,
    Growth,
    Bloom,
}

impl PatronTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Growth => "growth",
            Self::Bloom => "bloom",
        }
    }

    /// 对应的徽章 slug
    pub fn badge_slug(&self) -> &'static str {
        match self {
            Self::Seed => "patron-seed",
            Self::Growth => "patron-growth",
            Self::Bloom => "patron-bloom",
        }
    }
}

/// 排行榜类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKind {
    /// 持有徽章数
    #[default]
    Badges,
    KudosReceived,
    KudosSent,
}

impl LeaderboardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Badges => "badges",
            Self::KudosReceived => "kudos_received",
            Self::KudosSent => "kudos_sent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "badges" => Some(Self::Badges),
            "kudos_received" => Some(Self::KudosReceived),
            "kudos_sent" => Some(Self::KudosSent),
            _ => None,
        }
    }
}

/// 用户感谢列表的方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KudoDirection {
    #[default]
    Received,
    Sent,
    All,
}

impl KudoDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Sent => "sent",
            Self::All => "all",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "received" => Some(Self::Received),
            "sent" => Some(Self::Sent),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn includes_received(&self) -> bool {
        matches!(self, Self::Received | Self::All)
    }

    pub fn includes_sent(&self) -> bool {
        matches!(self, Self::Sent | Self::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_kind_parse() {
        assert_eq!(TriggerKind::from("KUDOS_RECEIVED"), TriggerKind::KudosReceived);
        assert_eq!(TriggerKind::from("PEER_AWARDS_COUNT"), TriggerKind::PeerAwardsCount);
        assert_eq!(
            TriggerKind::from("LINES_OF_CODE"),
            TriggerKind::Unknown("LINES_OF_CODE".to_string())
        );
    }

    #[test]
    fn test_trigger_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&TriggerKind::GithubPr).unwrap(),
            "\"GITHUB_PR\""
        );
        let unknown: TriggerKind = serde_json::from_str("\"SOMETHING_ELSE\"").unwrap();
        assert_eq!(unknown.as_str(), "SOMETHING_ELSE");
    }

    #[test]
    fn test_only_manual_is_manual() {
        assert!(TriggerKind::Manual.is_manual());
        assert!(!TriggerKind::ManualPeerAward.is_manual());
        assert!(!TriggerKind::KudosSent.is_manual());
    }

    #[test]
    fn test_badge_tier_ordering() {
        assert!(BadgeTier::Bronze < BadgeTier::Silver);
        assert!(BadgeTier::Silver < BadgeTier::Gold);
        assert_eq!(serde_json::to_string(&BadgeTier::Gold).unwrap(), "\"GOLD\"");
    }

    #[test]
    fn test_patron_tier_slug() {
        assert_eq!(PatronTier::Growth.badge_slug(), "patron-growth");
        let tier: PatronTier = serde_json::from_str("\"bloom\"").unwrap();
        assert_eq!(tier, PatronTier::Bloom);
    }

    #[test]
    fn test_leaderboard_kind_parse() {
        assert_eq!(LeaderboardKind::parse("kudos_sent"), Some(LeaderboardKind::KudosSent));
        assert_eq!(LeaderboardKind::parse("stars"), None);
        assert_eq!(LeaderboardKind::default().as_str(), "badges");
    }

    #[test]
    fn test_kudo_direction_includes() {
        assert!(KudoDirection::All.includes_received() && KudoDirection::All.includes_sent());
        assert!(!KudoDirection::Received.includes_sent());
        assert!(!KudoDirection::Sent.includes_received());
        assert_eq!(KudoDirection::parse("everything"), None);
    }
}
