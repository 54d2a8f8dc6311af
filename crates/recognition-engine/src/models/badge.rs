//! 徽章目录模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{BadgeTier, TriggerKind};

/// 徽章定义
///
/// 目录中的不可变条目。`threshold` 为空表示只能手动发放。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub tier: BadgeTier,
    /// 分类标签，仅用于展示
    pub category: String,
    #[sqlx(try_from = "String")]
    pub trigger_kind: TriggerKind,
    pub threshold: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl BadgeDefinition {
    /// 是否参与自动评估
    pub fn is_automatic(&self) -> bool {
        !self.trigger_kind.is_manual()
    }

    pub fn summary(&self) -> BadgeSummary {
        BadgeSummary::from(self)
    }
}

/// 徽章摘要（结果与通知中使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeSummary {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub tier: BadgeTier,
}

impl From<&BadgeDefinition> for BadgeSummary {
    fn from(badge: &BadgeDefinition) -> Self {
        Self {
            id: badge.id,
            slug: badge.slug.clone(),
            name: badge.name.clone(),
            tier: badge.tier,
        }
    }
}

/// 新增或更新目录条目（按 slug 幂等）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBadgeDefinition {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub tier: BadgeTier,
    pub category: String,
    pub trigger_kind: TriggerKind,
    pub threshold: Option<i32>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(kind: TriggerKind) -> BadgeDefinition {
        BadgeDefinition {
            id: 1,
            slug: "team-spirit".to_string(),
            name: "Team Spirit".to_string(),
            description: "Keeps team morale high.".to_string(),
            tier: BadgeTier::Silver,
            category: "collaboration".to_string(),
            trigger_kind: kind,
            threshold: Some(50),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_manual_badge_is_not_automatic() {
        assert!(!badge(TriggerKind::Manual).is_automatic());
        assert!(badge(TriggerKind::KudosReceived).is_automatic());
    }

    #[test]
    fn test_summary_serialization() {
        let json = serde_json::to_value(badge(TriggerKind::KudosReceived).summary()).unwrap();
        assert_eq!(json["slug"], "team-spirit");
        assert_eq!(json["tier"], "SILVER");
    }
}
