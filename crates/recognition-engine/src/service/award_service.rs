//! 徽章发放协调服务
//!
//! 负责自动评估（全量与单触发）、手动发放、撤销、进度查询与赞助徽章。
//!
//! ## 发放流程
//!
//! 1. 读取计数器快照 -> 2. 查询未持有的自动徽章 -> 3. 评估触发条件
//!    -> 4. 条件写入（唯一约束冲突视为已发放）-> 5. 异步通知
//!
//! 业务拒绝作为结果返回；存储错误通过 `Err` 传播并中止当前批次。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use recognition_shared::observability::metrics as app_metrics;

use crate::clock::Clock;
use crate::error::{Rejection, Result};
use crate::evaluator::TriggerEvaluator;
use crate::models::{
    Award, BadgeDefinition, InsertOutcome, LeaderboardKind, NewAward, PatronTier, SYSTEM_ACTOR,
    TriggerKind, UserCounters, progress_percentage, progress_target,
};
use crate::notification::{NotificationSender, PROGRESS_MILESTONES};
use crate::repository::Repositories;
use crate::service::dto::{AwardResult, BadgeProgress, HeldBadge, Leaderboard, RevokeResult};

/// 排行榜默认与最大条数
pub const LEADERBOARD_LIMIT_DEFAULT: u32 = 10;
pub const LEADERBOARD_LIMIT_MAX: u32 = 100;

/// 发放来源（指标标签）
mod source {
    pub const AUTOMATIC: &str = "automatic";
    pub const MANUAL: &str = "manual";
    pub const PATRON: &str = "patron";
}

/// 徽章发放协调服务
pub struct AwardService {
    repos: Repositories,
    evaluator: TriggerEvaluator,
    notifier: NotificationSender,
    clock: Arc<dyn Clock>,
}

impl AwardService {
    pub fn new(repos: Repositories, notifier: NotificationSender, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            evaluator: TriggerEvaluator::new(),
            notifier,
            clock,
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    pub fn notifier(&self) -> &NotificationSender {
        &self.notifier
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ==================== 查询 ====================

    /// 启用中的徽章目录
    #[instrument(skip(self))]
    pub async fn list_catalog(&self) -> Result<Vec<BadgeDefinition>> {
        self.repos.badges.list_active().await
    }

    /// 用户持有的徽章，按获得时间倒序
    #[instrument(skip(self))]
    pub async fn list_user_badges(&self, user_id: i64) -> Result<Vec<HeldBadge>> {
        let awards = self.repos.awards.list_awards(user_id).await?;
        if awards.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = awards.iter().map(|a| a.badge_id).collect();
        let badges: HashMap<i64, BadgeDefinition> = self
            .repos
            .badges
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(awards
            .into_iter()
            .filter_map(|award| {
                badges
                    .get(&award.badge_id)
                    .cloned()
                    .map(|badge| HeldBadge::new(badge, award))
            })
            .collect())
    }

    /// 计数器快照
    #[instrument(skip(self))]
    pub async fn user_counters(&self, user_id: i64) -> Result<UserCounters> {
        self.repos.counters.fetch_counters(user_id, self.now()).await
    }

    /// 排行榜，条数限制在 1..=100
    #[instrument(skip(self, kind), fields(kind = kind.as_str()))]
    pub async fn leaderboard(&self, kind: LeaderboardKind, limit: u32) -> Result<Leaderboard> {
        let limit = limit.clamp(1, LEADERBOARD_LIMIT_MAX);
        let leaderboard = self.repos.users.leaderboard(kind, limit).await?;
        Ok(Leaderboard { kind, leaderboard })
    }

    // ==================== 自动评估 ====================

    /// 全量评估：检查所有未持有的自动徽章
    #[instrument(skip(self))]
    pub async fn evaluate_automatic_badges(&self, user_id: i64) -> Result<Vec<AwardResult>> {
        self.evaluate(user_id, None).await
    }

    /// 单触发评估：只检查指定触发类型，并对未满足但到达里程碑的徽章发送进度通知
    #[instrument(skip(self), fields(trigger_kind = %kind))]
    pub async fn evaluate_single_trigger(
        &self,
        user_id: i64,
        kind: TriggerKind,
    ) -> Result<Vec<AwardResult>> {
        self.evaluate(user_id, Some(kind)).await
    }

    async fn evaluate(&self, user_id: i64, kind: Option<TriggerKind>) -> Result<Vec<AwardResult>> {
        let started = Instant::now();
        let single = kind.is_some();
        let scope = if single { "single" } else { "full" };

        let counters = self.repos.counters.fetch_counters(user_id, self.now()).await?;
        let candidates = self.repos.badges.list_unheld_automatic(user_id, kind).await?;

        let mut results = Vec::new();
        for badge in candidates {
            if !self
                .evaluator
                .qualifies(&badge.trigger_kind, badge.threshold, &counters)
            {
                if single {
                    self.notify_milestone(user_id, &badge, &counters);
                }
                continue;
            }

            let stored_reason = format!("Automatic achievement: {}", badge.name);
            let inserted = self
                .insert_award(user_id, &badge, SYSTEM_ACTOR, Some(stored_reason), source::AUTOMATIC)
                .await?;
            if inserted.is_some() {
                let reason = if single {
                    "New badge unlocked!".to_string()
                } else {
                    format!("You completed the requirement for {}", badge.name)
                };
                results.push(AwardResult::awarded(Some(badge.summary()), reason));
            }
        }

        app_metrics::record_evaluation(scope, results.len(), started.elapsed().as_secs_f64());
        info!(user_id, scope, awarded = results.len(), "徽章评估完成");
        Ok(results)
    }

    fn notify_milestone(&self, user_id: i64, badge: &BadgeDefinition, counters: &UserCounters) {
        if !matches!(badge.threshold, Some(t) if t > 0) {
            return;
        }
        let Some(progress) = counters.get(&badge.trigger_kind) else {
            return;
        };

        let percentage = progress_percentage(progress, badge.threshold);
        if PROGRESS_MILESTONES.contains(&percentage) {
            debug!(user_id, badge_slug = %badge.slug, percentage, "到达进度里程碑");
            self.notifier.send_badge_progress(
                user_id,
                &badge.summary(),
                progress,
                progress_target(badge.threshold),
                percentage,
            );
        }
    }

    // ==================== 手动发放与撤销 ====================

    /// 手动发放（管理员权限，不检查触发条件）
    #[instrument(skip(self, reason))]
    pub async fn award_badge(
        &self,
        user_id: i64,
        slug: &str,
        awarded_by: &str,
        reason: Option<&str>,
    ) -> Result<AwardResult> {
        let badge = match self.resolve_target(user_id, slug).await? {
            Ok(badge) => badge,
            Err(rejection) => return Ok(self.reject(source::MANUAL, user_id, rejection)),
        };

        if self.repos.awards.find_award(user_id, badge.id).await?.is_some() {
            return Ok(self.reject(source::MANUAL, user_id, already_awarded(&badge)));
        }

        let stored_reason = reason
            .map(str::to_string)
            .unwrap_or_else(|| format!("Awarded by {awarded_by}"));
        let inserted = self
            .insert_award(user_id, &badge, awarded_by, Some(stored_reason), source::MANUAL)
            .await?;
        if inserted.is_none() {
            return Ok(self.reject(source::MANUAL, user_id, already_awarded(&badge)));
        }

        let result_reason = reason
            .map(str::to_string)
            .unwrap_or_else(|| format!("Badge {} awarded successfully", badge.name));
        Ok(AwardResult::awarded(Some(badge.summary()), result_reason))
    }

    /// 撤销徽章（物理删除）
    #[instrument(skip(self))]
    pub async fn revoke_badge(&self, user_id: i64, slug: &str) -> Result<RevokeResult> {
        let badge = match self.resolve_target(user_id, slug).await? {
            Ok(badge) => badge,
            Err(rejection) => {
                app_metrics::record_badge_revocation("rejected");
                return Ok(RevokeResult::rejected(rejection));
            }
        };

        if !self.repos.awards.delete_award(user_id, badge.id).await? {
            app_metrics::record_badge_revocation("rejected");
            return Ok(RevokeResult::rejected(Rejection::NotHeld {
                slug: badge.slug.clone(),
            }));
        }

        app_metrics::record_badge_revocation("revoked");
        info!(user_id, badge_slug = %badge.slug, "徽章已撤销");
        Ok(RevokeResult::revoked(format!("Badge {} revoked", badge.name)))
    }

    // ==================== 进度 ====================

    /// 未持有的自动徽章进度，按百分比降序（稳定排序），只保留未完成的条目
    #[instrument(skip(self))]
    pub async fn get_badge_progress(&self, user_id: i64) -> Result<Vec<BadgeProgress>> {
        let counters = self.repos.counters.fetch_counters(user_id, self.now()).await?;
        let candidates = self.repos.badges.list_unheld_automatic(user_id, None).await?;

        let mut progress: Vec<BadgeProgress> = candidates
            .iter()
            .filter(|badge| matches!(badge.threshold, Some(t) if t > 0))
            .filter_map(|badge| {
                let value = counters.get(&badge.trigger_kind)?;
                Some(BadgeProgress {
                    badge: badge.summary(),
                    progress: value,
                    target: progress_target(badge.threshold),
                    percentage: progress_percentage(value, badge.threshold),
                })
            })
            .filter(|p| p.percentage < 100)
            .collect();

        progress.sort_by(|a, b| b.percentage.cmp(&a.percentage));
        Ok(progress)
    }

    // ==================== 赞助徽章 ====================

    /// 发放赞助徽章
    #[instrument(skip(self, tier, payment_reference, impact_choice), fields(tier = tier.as_str()))]
    pub async fn award_patron_badge(
        &self,
        user_id: i64,
        tier: PatronTier,
        payment_reference: Option<&str>,
        impact_choice: Option<&str>,
    ) -> Result<AwardResult> {
        let badge = match self.resolve_target(user_id, tier.badge_slug()).await? {
            Ok(badge) => badge,
            Err(rejection) => return Ok(self.reject(source::PATRON, user_id, rejection)),
        };

        if self.repos.awards.find_award(user_id, badge.id).await?.is_some() {
            return Ok(self.reject(source::PATRON, user_id, already_awarded(&badge)));
        }

        let mut stored_reason = format!("Patron {}", tier.as_str());
        if let Some(impact) = impact_choice {
            stored_reason.push_str(&format!(" - Impact: {impact}"));
        }
        if let Some(reference) = payment_reference {
            stored_reason.push_str(&format!(" (Ref: {reference})"));
        }

        let inserted = self
            .insert_award(user_id, &badge, SYSTEM_ACTOR, Some(stored_reason), source::PATRON)
            .await?;
        if inserted.is_none() {
            return Ok(self.reject(source::PATRON, user_id, already_awarded(&badge)));
        }

        Ok(AwardResult::awarded(
            Some(badge.summary()),
            format!("Thank you for your support! Patron {} badge awarded", tier.as_str()),
        ))
    }

    // ==================== 内部 ====================

    /// 解析发放目标：徽章不存在或用户不存在时返回拒绝
    async fn resolve_target(
        &self,
        user_id: i64,
        slug: &str,
    ) -> Result<std::result::Result<BadgeDefinition, Rejection>> {
        let Some(badge) = self.repos.badges.find_by_slug(slug).await? else {
            return Ok(Err(Rejection::BadgeNotFound {
                slug: slug.to_string(),
            }));
        };

        if self.repos.users.find_by_id(user_id).await?.is_none() {
            return Ok(Err(Rejection::UserNotFound { user_id }));
        }

        Ok(Ok(badge))
    }

    /// 条件写入持有记录；成功时发送获得通知，唯一约束冲突时返回 None
    pub(crate) async fn insert_award(
        &self,
        user_id: i64,
        badge: &BadgeDefinition,
        awarded_by: &str,
        reason: Option<String>,
        source: &str,
    ) -> Result<Option<Award>> {
        let award = NewAward {
            user_id,
            badge_id: badge.id,
            awarded_by: awarded_by.to_string(),
            reason,
            awarded_at: self.now(),
        };

        match self.repos.awards.insert_if_absent(&award).await? {
            InsertOutcome::Inserted(saved) => {
                app_metrics::record_badge_award(source, "awarded");
                info!(user_id, badge_slug = %badge.slug, awarded_by, source, "徽章已发放");
                self.notifier.send_badge_earned(user_id, &badge.summary());
                Ok(Some(saved))
            }
            InsertOutcome::AlreadyExists => {
                app_metrics::record_badge_award(source, "already_awarded");
                debug!(user_id, badge_slug = %badge.slug, "徽章已持有，忽略重复写入");
                Ok(None)
            }
        }
    }

    pub(crate) fn reject(&self, source: &str, user_id: i64, rejection: Rejection) -> AwardResult {
        app_metrics::record_badge_award(source, "rejected");
        warn!(user_id, source, code = rejection.code(), reason = %rejection, "徽章发放被拒绝");
        AwardResult::rejected(rejection)
    }
}

fn already_awarded(badge: &BadgeDefinition) -> Rejection {
    Rejection::AlreadyAwarded {
        slug: badge.slug.clone(),
    }
}
