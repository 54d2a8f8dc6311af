//! 通知类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::BadgeSummary;

/// 进度通知触发的百分比里程碑
pub const PROGRESS_MILESTONES: [u8; 3] = [50, 75, 90];

const PREVIEW_CHARS: usize = 50;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BadgeEarned,
    BadgeProgress,
    KudoReceived,
    PeerAwardReceived,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadgeEarned => "BADGE_EARNED",
            Self::BadgeProgress => "BADGE_PROGRESS",
            Self::KudoReceived => "KUDO_RECEIVED",
            Self::PeerAwardReceived => "PEER_AWARD_RECEIVED",
        }
    }
}

/// 通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// 通知唯一标识
    pub notification_id: String,
    /// 接收用户
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// 附带的业务数据
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: i64,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            notification_id: Uuid::now_v7().to_string(),
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            data: serde_json::Value::Object(serde_json::Map::new()),
            created_at: Utc::now(),
        }
    }

    /// 添加业务数据
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = &mut self.data {
            map.insert(key.into(), value);
        }
        self
    }

    /// 获得徽章
    pub fn badge_earned(user_id: i64, badge: &BadgeSummary) -> Self {
        Self::new(
            user_id,
            NotificationKind::BadgeEarned,
            format!("{} New Badge Unlocked!", badge.tier.emoji()),
            format!("You earned the badge \"{}\"", badge.name),
        )
        .with_data("badgeId", badge.id.into())
        .with_data("badgeSlug", badge.slug.clone().into())
    }

    /// 接近获得徽章
    pub fn badge_progress(
        user_id: i64,
        badge: &BadgeSummary,
        progress: i64,
        target: i64,
        percentage: u8,
    ) -> Self {
        Self::new(
            user_id,
            NotificationKind::BadgeProgress,
            format!("🎯 You're close to \"{}\"!", badge.name),
            format!("Progress: {progress}/{target} ({percentage}%)"),
        )
        .with_data("badgeId", badge.id.into())
        .with_data("badgeSlug", badge.slug.clone().into())
        .with_data("percentage", percentage.into())
    }

    /// 收到感谢
    pub fn kudo_received(user_id: i64, kudo_id: i64, from_label: &str, message: &str) -> Self {
        Self::new(
            user_id,
            NotificationKind::KudoReceived,
            "🎉 You received a Kudo!",
            format!(
                "{from_label} sent you a kudo: \"{}\"",
                message_preview(message)
            ),
        )
        .with_data("kudoId", kudo_id.into())
    }

    /// 收到同伴徽章
    pub fn peer_award_received(user_id: i64, from_label: &str, message: &str) -> Self {
        Self::new(
            user_id,
            NotificationKind::PeerAwardReceived,
            "💫 You received a Resonance badge!",
            format!(
                "{from_label} recognized you: \"{}\"",
                message_preview(message)
            ),
        )
    }
}

/// 截断到 50 个字符，超出部分以 `...` 结尾
pub fn message_preview(message: &str) -> String {
    if message.chars().count() > PREVIEW_CHARS {
        let head: String = message.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BadgeTier;

    fn summary(tier: BadgeTier) -> BadgeSummary {
        BadgeSummary {
            id: 7,
            slug: "code-ninja".to_string(),
            name: "Code Ninja".to_string(),
            tier,
        }
    }

    #[test]
    fn test_badge_earned_title_uses_tier_emoji() {
        let gold = Notification::badge_earned(1, &summary(BadgeTier::Gold));
        assert_eq!(gold.title, "🥇 New Badge Unlocked!");
        assert_eq!(gold.body, "You earned the badge \"Code Ninja\"");
        assert_eq!(gold.data["badgeSlug"], "code-ninja");

        let bronze = Notification::badge_earned(1, &summary(BadgeTier::Bronze));
        assert!(bronze.title.starts_with("🥉"));
    }

    #[test]
    fn test_badge_progress_body() {
        let n = Notification::badge_progress(1, &summary(BadgeTier::Silver), 5, 10, 50);
        assert_eq!(n.kind, NotificationKind::BadgeProgress);
        assert_eq!(n.title, "🎯 You're close to \"Code Ninja\"!");
        assert_eq!(n.body, "Progress: 5/10 (50%)");
    }

    #[test]
    fn test_message_preview_truncates_on_chars() {
        assert_eq!(message_preview("short"), "short");
        let exact = "a".repeat(50);
        assert_eq!(message_preview(&exact), exact);

        let long = "ñ".repeat(60);
        let preview = message_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 53);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_value(NotificationKind::KudoReceived).unwrap();
        assert_eq!(json, "KUDO_RECEIVED");
        assert_eq!(NotificationKind::BadgeEarned.as_str(), "BADGE_EARNED");
        assert_eq!(
            serde_json::to_value(NotificationKind::PeerAwardReceived).unwrap(),
            NotificationKind::PeerAwardReceived.as_str()
        );
    }

    #[test]
    fn test_peer_award_received_body() {
        let n = Notification::peer_award_received(4, "Ana", "Thanks for pairing on the migration");
        assert_eq!(n.kind, NotificationKind::PeerAwardReceived);
        assert_eq!(n.user_id, 4);
        assert_eq!(n.body, "Ana recognized you: \"Thanks for pairing on the migration\"");
    }
}
