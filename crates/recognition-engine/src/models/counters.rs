//! 用户计数器快照
//!
//! 计数器由活动数据聚合而来，与并发写入不保证事务一致。

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::TriggerKind;

/// 连续活跃天数回溯的最大记录条数与天数
pub const STREAK_LOOKBACK: usize = 30;

/// 用户计数器快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounters {
    pub kudos_received: i64,
    pub kudos_sent: i64,
    pub code_reviews: i64,
    pub pull_requests: i64,
    pub issues_closed: i64,
    pub streak_days: i64,
    pub tenure_days: i64,
    pub github_commits: i64,
    pub github_prs: i64,
    pub github_reviews: i64,
    pub peer_awards_received: i64,
    pub peer_awards_given: i64,
    pub total_badges: i64,
}

impl UserCounters {
    /// 读取触发类型对应的计数器
    ///
    /// 没有计数器的类型（手动、首次行为、赞助、未知）返回 None。
    pub fn get(&self, kind: &TriggerKind) -> Option<i64> {
        let value = match kind {
            TriggerKind::KudosReceived => self.kudos_received,
            TriggerKind::KudosSent => self.kudos_sent,
            TriggerKind::CodeReviews => self.code_reviews,
            TriggerKind::PullRequests => self.pull_requests,
            TriggerKind::IssuesClosed => self.issues_closed,
            TriggerKind::StreakDays => self.streak_days,
            TriggerKind::TenureDays => self.tenure_days,
            TriggerKind::BadgesCount => self.total_badges,
            TriggerKind::GithubCommit => self.github_commits,
            TriggerKind::GithubPr => self.github_prs,
            TriggerKind::GithubReview => self.github_reviews,
            TriggerKind::PeerAwardsCount => self.peer_awards_received,
            TriggerKind::Manual
            | TriggerKind::ManualPeerAward
            | TriggerKind::FirstAction
            | TriggerKind::Investment
            | TriggerKind::Unknown(_) => return None,
        };
        Some(value)
    }
}

/// 入职天数：向下取整的完整天数
pub fn tenure_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

/// 连续活跃天数
///
/// 从今天起向前逐日检查，最多 30 天。今天无活动不算中断，
/// 之后任何一天缺失即停止。`activity` 只取最近 30 条记录。
pub fn streak_days(activity: &[DateTime<Utc>], now: DateTime<Utc>) -> i64 {
    let mut recent: Vec<DateTime<Utc>> = activity.to_vec();
    recent.sort_unstable_by(|a, b| b.cmp(a));
    recent.truncate(STREAK_LOOKBACK);

    let days: BTreeSet<NaiveDate> = recent.iter().map(|t| t.date_naive()).collect();
    let today = now.date_naive();

    let mut streak = 0;
    for offset in 0..STREAK_LOOKBACK as u64 {
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };
        if days.contains(&day) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

/// 进度百分比：min(100, round(progress / target * 100))，四舍五入
///
/// 阈值缺失或非正时目标按 1 计算。
pub fn progress_percentage(progress: i64, threshold: Option<i32>) -> u8 {
    let target = progress_target(threshold);
    let progress = progress.max(0);
    let rounded = (progress.saturating_mul(200).saturating_add(target)) / (2 * target);
    rounded.min(100) as u8
}

/// 进度目标值
pub fn progress_target(threshold: Option<i32>) -> i64 {
    match threshold {
        Some(t) if t > 0 => i64::from(t),
        _ => 1,
    }
}
