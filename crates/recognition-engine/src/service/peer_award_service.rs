//! 同伴徽章服务
//!
//! 每位发放人每个自然年（UTC）限额发放，限额在发放人维度的临界区内复核。
//! 接收人累计数跨过 PEER_AWARDS_COUNT 层级时，只授予新跨过的最高层级。
//! 发放人用完当年最后一个名额时获得 MANUAL_PEER_AWARD 徽章。

use std::sync::Arc;

use chrono::Datelike;
use tracing::{info, instrument};

use recognition_shared::observability::metrics as app_metrics;

use crate::error::{Rejection, Result};
use crate::models::{BadgeDefinition, NewPeerGrant, PeerGrantInsert, SYSTEM_ACTOR, TriggerKind};
use crate::service::award_service::AwardService;
use crate::service::dto::{AwardResult, PeerAwardStatus};

const SOURCE: &str = "peer";
const GENEROUS_SOURCE: &str = "generous_spirit";

/// 同伴徽章服务配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAwardPolicy {
    /// 每人每年可发放数量
    pub annual_quota: u32,
    /// 留言去除首尾空白后的最少字符数
    pub min_message_len: usize,
}

impl Default for PeerAwardPolicy {
    fn default() -> Self {
        Self {
            annual_quota: 2,
            min_message_len: 10,
        }
    }
}

/// 同伴徽章服务
pub struct PeerAwardService {
    awards: Arc<AwardService>,
    policy: PeerAwardPolicy,
}

impl PeerAwardService {
    pub fn new(awards: Arc<AwardService>, policy: PeerAwardPolicy) -> Self {
        Self { awards, policy }
    }

    pub fn policy(&self) -> PeerAwardPolicy {
        self.policy
    }

    fn current_year(&self) -> i32 {
        self.awards.now().year()
    }

    /// 发放同伴徽章
    ///
    /// 不检查发放人与接收人是否相同，由调用方负责。
    #[instrument(skip(self, message))]
    pub async fn award_peer_badge(
        &self,
        from_user_id: i64,
        to_user_id: i64,
        message: &str,
    ) -> Result<AwardResult> {
        let message = message.trim();
        if message.chars().count() < self.policy.min_message_len {
            return Ok(self.reject(
                from_user_id,
                Rejection::validation(format!(
                    "Message must be at least {} characters",
                    self.policy.min_message_len
                )),
            ));
        }

        let repos = self.awards.repositories();
        if repos.users.find_by_id(to_user_id).await?.is_none() {
            return Ok(self.reject(from_user_id, Rejection::UserNotFound { user_id: to_user_id }));
        }
        let Some(granter) = repos.users.find_by_id(from_user_id).await? else {
            return Ok(self.reject(
                from_user_id,
                Rejection::UserNotFound {
                    user_id: from_user_id,
                },
            ));
        };

        let now = self.awards.now();
        let year = now.year();
        let quota = self.policy.annual_quota;

        let used = repos.peer_grants.count_grants_in_year(from_user_id, year).await?;
        if used >= quota {
            return Ok(self.reject(from_user_id, self.quota_exceeded(year)));
        }

        let grant = NewPeerGrant {
            from_user_id,
            to_user_id,
            message: message.to_string(),
            granted_at: now,
        };
        if let PeerGrantInsert::QuotaExhausted { .. } = repos
            .peer_grants
            .record_grant_within_quota(&grant, quota)
            .await?
        {
            return Ok(self.reject(from_user_id, self.quota_exceeded(year)));
        }
        app_metrics::record_peer_award("granted");
        info!(from_user_id, to_user_id, year, "同伴徽章已记录");
        self.awards
            .notifier()
            .send_peer_award_received(to_user_id, granter.label(), message);

        let tier = self.award_crossed_tier(to_user_id, &granter.username, message).await?;

        let used_after = repos.peer_grants.count_grants_in_year(from_user_id, year).await?;
        if used_after >= quota {
            self.award_generous_spirit(from_user_id).await?;
        }

        Ok(AwardResult::awarded(
            tier.map(|b| b.summary()),
            format!("Resonance badge awarded: \"{message}\""),
        ))
    }

    /// 当年剩余可发放数量
    #[instrument(skip(self))]
    pub async fn get_remaining_peer_awards(&self, user_id: i64) -> Result<u32> {
        let used = self
            .awards
            .repositories()
            .peer_grants
            .count_grants_in_year(user_id, self.current_year())
            .await?;
        Ok(self.policy.annual_quota.saturating_sub(used))
    }

    /// 当年限额状态与提示语
    #[instrument(skip(self))]
    pub async fn peer_award_status(&self, user_id: i64) -> Result<PeerAwardStatus> {
        let remaining = self.get_remaining_peer_awards(user_id).await?;
        let message = if remaining > 0 {
            let plural = if remaining == 1 { "" } else { "s" };
            format!("You have {remaining} Resonance badge{plural} left to award this year")
        } else {
            "You have used all your Resonance badges for this year".to_string()
        };

        Ok(PeerAwardStatus {
            remaining,
            max_per_year: self.policy.annual_quota,
            year: self.current_year(),
            message,
        })
    }

    /// 授予接收人新跨过的最高层级徽章
    async fn award_crossed_tier(
        &self,
        to_user_id: i64,
        granter_username: &str,
        message: &str,
    ) -> Result<Option<BadgeDefinition>> {
        let repos = self.awards.repositories();
        let counters = repos
            .counters
            .fetch_counters(to_user_id, self.awards.now())
            .await?;
        let received = counters.peer_awards_received;

        let highest = repos
            .badges
            .list_unheld_automatic(to_user_id, Some(TriggerKind::PeerAwardsCount))
            .await?
            .into_iter()
            .filter(|b| matches!(b.threshold, Some(t) if t > 0 && i64::from(t) <= received))
            .max_by_key(|b| b.threshold);

        let Some(badge) = highest else {
            return Ok(None);
        };

        let inserted = self
            .awards
            .insert_award(
                to_user_id,
                &badge,
                granter_username,
                Some(message.to_string()),
                SOURCE,
            )
            .await?;
        Ok(inserted.map(|_| badge))
    }

    /// 用完年度名额的发放人获得 MANUAL_PEER_AWARD 徽章（如已配置）
    async fn award_generous_spirit(&self, from_user_id: i64) -> Result<()> {
        let repos = self.awards.repositories();
        let badge = repos
            .badges
            .list_active()
            .await?
            .into_iter()
            .find(|b| b.trigger_kind == TriggerKind::ManualPeerAward);

        let Some(badge) = badge else {
            return Ok(());
        };

        let reason = format!("Awarded all {} peer badges this year", self.policy.annual_quota);
        self.awards
            .insert_award(from_user_id, &badge, SYSTEM_ACTOR, Some(reason), GENEROUS_SOURCE)
            .await?;
        Ok(())
    }

    fn quota_exceeded(&self, year: i32) -> Rejection {
        Rejection::QuotaExceeded {
            year,
            max_per_year: self.policy.annual_quota,
            remaining: 0,
        }
    }

    fn reject(&self, from_user_id: i64, rejection: Rejection) -> AwardResult {
        app_metrics::record_peer_award(rejection.code());
        self.awards.reject(SOURCE, from_user_id, rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::UserRecord;
    use crate::notification::NotificationSender;
    use crate::repository::{
        MockAwardRepositoryTrait, MockBadgeRepositoryTrait, MockCounterRepositoryTrait,
        MockKudoRepositoryTrait, MockPeerGrantRepositoryTrait, MockUserRepositoryTrait,
        Repositories,
    };
    use chrono::{TimeZone, Utc};

    fn service(
        users: MockUserRepositoryTrait,
        peer_grants: MockPeerGrantRepositoryTrait,
    ) -> PeerAwardService {
        let repos = Repositories {
            badges: Arc::new(MockBadgeRepositoryTrait::new()),
            awards: Arc::new(MockAwardRepositoryTrait::new()),
            counters: Arc::new(MockCounterRepositoryTrait::new()),
            peer_grants: Arc::new(peer_grants),
            users: Arc::new(users),
            kudos: Arc::new(MockKudoRepositoryTrait::new()),
        };
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        let awards = AwardService::new(repos, NotificationSender::log_only(), Arc::new(clock));
        PeerAwardService::new(Arc::new(awards), PeerAwardPolicy::default())
    }

    fn user(id: i64) -> UserRecord {
        UserRecord {
            id,
            username: format!("user{id}"),
            display_name: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_short_message_rejected_before_store_access() {
        // 未设置任何期望，访问存储即 panic
        let service = service(MockUserRepositoryTrait::new(), MockPeerGrantRepositoryTrait::new());

        let result = service
            .award_peer_badge(1, 2, "   short     ")
            .await
            .unwrap();
        assert!(matches!(result.rejection, Some(Rejection::Validation { .. })));
    }

    #[tokio::test]
    async fn test_quota_exhausted_before_write() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        let mut grants = MockPeerGrantRepositoryTrait::new();
        grants
            .expect_count_grants_in_year()
            .withf(|from, year| *from == 1 && *year == 2025)
            .returning(|_, _| Ok(2));

        let service = service(users, grants);
        let result = service
            .award_peer_badge(1, 2, "Thanks for unblocking the release")
            .await
            .unwrap();

        assert_eq!(
            result.rejection,
            Some(Rejection::QuotaExceeded {
                year: 2025,
                max_per_year: 2,
                remaining: 0,
            })
        );
    }

    #[tokio::test]
    async fn test_lost_race_is_quota_exceeded() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        let mut grants = MockPeerGrantRepositoryTrait::new();
        grants.expect_count_grants_in_year().returning(|_, _| Ok(1));
        grants
            .expect_record_grant_within_quota()
            .returning(|_, _| Ok(PeerGrantInsert::QuotaExhausted { used: 2 }));

        let service = service(users, grants);
        let result = service
            .award_peer_badge(1, 2, "Thanks for unblocking the release")
            .await
            .unwrap();

        assert!(matches!(
            result.rejection,
            Some(Rejection::QuotaExceeded { remaining: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_recipient() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let service = service(users, MockPeerGrantRepositoryTrait::new());
        let result = service
            .award_peer_badge(1, 99, "Thanks for unblocking the release")
            .await
            .unwrap();

        assert_eq!(result.rejection, Some(Rejection::UserNotFound { user_id: 99 }));
    }

    #[tokio::test]
    async fn test_remaining_never_negative() {
        let mut grants = MockPeerGrantRepositoryTrait::new();
        grants.expect_count_grants_in_year().returning(|_, _| Ok(5));

        let service = service(MockUserRepositoryTrait::new(), grants);
        assert_eq!(service.get_remaining_peer_awards(1).await.unwrap(), 0);

        let status = service.peer_award_status(1).await.unwrap();
        assert_eq!(status.message, "You have used all your Resonance badges for this year");
        assert_eq!(status.year, 2025);
    }

    #[tokio::test]
    async fn test_status_message_with_remaining() {
        let mut grants = MockPeerGrantRepositoryTrait::new();
        grants.expect_count_grants_in_year().returning(|_, _| Ok(1));

        let service = service(MockUserRepositoryTrait::new(), grants);
        let status = service.peer_award_status(1).await.unwrap();

        assert_eq!(status.remaining, 1);
        assert_eq!(status.max_per_year, 2);
        assert_eq!(status.message, "You have 1 Resonance badge left to award this year");
    }

    #[tokio::test]
    async fn test_status_message_pluralizes() {
        let mut grants = MockPeerGrantRepositoryTrait::new();
        grants.expect_count_grants_in_year().returning(|_, _| Ok(0));

        let service = service(MockUserRepositoryTrait::new(), grants);
        let status = service.peer_award_status(1).await.unwrap();

        assert_eq!(status.remaining, 2);
        assert_eq!(status.message, "You have 2 Resonance badges left to award this year");
    }
}
