//! 进程内存储
//!
//! 与 PostgreSQL 实现语义一致（唯一约束、限额临界区），用于本地运行与测试。
//! 所有状态位于同一把读写锁之下，单次操作天然原子。

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use parking_lot::RwLock;

use super::traits::{
    AwardRepositoryTrait, BadgeRepositoryTrait, CounterRepositoryTrait, KudoRepositoryTrait,
    PeerGrantRepositoryTrait, UserRepositoryTrait,
};
use crate::error::{EngineError, Result};
use crate::models::{
    Award, BadgeDefinition, GithubStats, InsertOutcome, Kudo, KudoDirection, LeaderboardEntry,
    LeaderboardKind, NewAward, NewBadgeDefinition, NewKudo, NewPeerGrant, PeerGrant,
    PeerGrantInsert, TriggerKind, UserCounters, UserRecord, streak_days, tenure_days,
    STREAK_LOOKBACK,
};

#[derive(Default)]
struct StoreState {
    next_id: i64,
    users: BTreeMap<i64, UserRecord>,
    badges: BTreeMap<i64, BadgeDefinition>,
    awards: BTreeMap<(i64, i64), Award>,
    peer_grants: Vec<PeerGrant>,
    kudos: Vec<Kudo>,
    github: HashMap<i64, GithubStats>,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn grants_in_year(&self, from_user_id: i64, year: i32) -> u32 {
        let count = self
            .peer_grants
            .iter()
            .filter(|g| g.from_user_id == from_user_id && g.granted_at.year() == year)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn tally(&self, kind: LeaderboardKind, user_id: i64) -> usize {
        match kind {
            LeaderboardKind::Badges => self.awards.values().filter(|a| a.user_id == user_id).count(),
            LeaderboardKind::KudosReceived => {
                self.kudos.iter().filter(|k| k.to_user_id == user_id).count()
            }
            LeaderboardKind::KudosSent => {
                self.kudos.iter().filter(|k| k.from_user_id == user_id).count()
            }
        }
    }

    /// 按时间倒序排列的感谢记录
    fn kudos_newest_first(&self) -> Vec<&Kudo> {
        let mut kudos: Vec<&Kudo> = self.kudos.iter().collect();
        kudos.sort_by_key(|k| Reverse((k.created_at, k.id)));
        kudos
    }
}

fn limit_len(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// 进程内存储
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟存储故障：开启后所有仓储操作返回 `StoreUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::StoreUnavailable("内存存储已被标记为不可用".to_string()));
        }
        Ok(())
    }

    /// 新增用户
    pub fn add_user(
        &self,
        username: &str,
        display_name: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> UserRecord {
        let mut state = self.state.write();
        let user = UserRecord {
            id: state.next_id(),
            username: username.to_string(),
            display_name: display_name.map(str::to_string),
            created_at,
        };
        state.users.insert(user.id, user.clone());
        user
    }

    /// 写入 GitHub 统计（覆盖）
    pub fn set_github_stats(&self, user_id: i64, stats: GithubStats) {
        self.state.write().github.insert(user_id, stats);
    }

    /// 当前持有记录总数
    pub fn award_count(&self) -> usize {
        self.state.read().awards.len()
    }
}

#[async_trait]
impl BadgeRepositoryTrait for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BadgeDefinition>> {
        self.ensure_available()?;
        let state = self.state.read();
        Ok(state.badges.values().find(|b| b.slug == slug).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<BadgeDefinition>> {
        self.ensure_available()?;
        let state = self.state.read();
        Ok(state
            .badges
            .values()
            .filter(|b| ids.contains(&b.id))
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<BadgeDefinition>> {
        self.ensure_available()?;
        let state = self.state.read();
        Ok(state.badges.values().filter(|b| b.is_active).cloned().collect())
    }

    async fn list_unheld_automatic(
        &self,
        user_id: i64,
        kind: Option<TriggerKind>,
    ) -> Result<Vec<BadgeDefinition>> {
        self.ensure_available()?;
        let state = self.state.read();
        Ok(state
            .badges
            .values()
            .filter(|b| b.is_active && b.is_automatic())
            .filter(|b| kind.as_ref().is_none_or(|k| &b.trigger_kind == k))
            .filter(|b| !state.awards.contains_key(&(user_id, b.id)))
            .cloned()
            .collect())
    }

    async fn upsert(&self, badge: &NewBadgeDefinition) -> Result<BadgeDefinition> {
        self.ensure_available()?;
        let mut state = self.state.write();
        let existing = state
            .badges
            .values()
            .find(|b| b.slug == badge.slug)
            .map(|b| (b.id, b.created_at));
        let (id, created_at) = match existing {
            Some(found) => found,
            None => (state.next_id(), Utc::now()),
        };

        let saved = BadgeDefinition {
            id,
            slug: badge.slug.clone(),
            name: badge.name.clone(),
            description: badge.description.clone(),
            tier: badge.tier,
            category: badge.category.clone(),
            trigger_kind: badge.trigger_kind.clone(),
            threshold: badge.threshold,
            is_active: badge.is_active,
            created_at,
        };
        state.badges.insert(id, saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl AwardRepositoryTrait for InMemoryStore {
    async fn find_award(&self, user_id: i64, badge_id: i64) -> Result<Option<Award>> {
        self.ensure_available()?;
        Ok(self.state.read().awards.get(&(user_id, badge_id)).cloned())
    }

    async fn list_awards(&self, user_id: i64) -> Result<Vec<Award>> {
        self.ensure_available()?;
        let state = self.state.read();
        let mut awards: Vec<Award> = state
            .awards
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        awards.sort_by(|a, b| b.awarded_at.cmp(&a.awarded_at).then(b.id.cmp(&a.id)));
        Ok(awards)
    }

    async fn insert_if_absent(&self, award: &NewAward) -> Result<InsertOutcome> {
        self.ensure_available()?;
        let mut state = self.state.write();
        let key = (award.user_id, award.badge_id);
        if state.awards.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }

        let saved = Award {
            id: state.next_id(),
            user_id: award.user_id,
            badge_id: award.badge_id,
            awarded_by: award.awarded_by.clone(),
            reason: award.reason.clone(),
            awarded_at: award.awarded_at,
        };
        state.awards.insert(key, saved.clone());
        Ok(InsertOutcome::Inserted(saved))
    }

    async fn delete_award(&self, user_id: i64, badge_id: i64) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.state.write().awards.remove(&(user_id, badge_id)).is_some())
    }
}

#[async_trait]
impl CounterRepositoryTrait for InMemoryStore {
    async fn fetch_counters(&self, user_id: i64, now: DateTime<Utc>) -> Result<UserCounters> {
        self.ensure_available()?;
        let state = self.state.read();
        let Some(user) = state.users.get(&user_id) else {
            return Ok(UserCounters::default());
        };

        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        let github = state.github.get(&user_id).cloned().unwrap_or_default();

        let mut activity: Vec<DateTime<Utc>> = state
            .awards
            .values()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.awarded_at)
            .collect();
        activity.sort_unstable_by(|a, b| b.cmp(a));
        activity.truncate(STREAK_LOOKBACK);

        Ok(UserCounters {
            kudos_received: count(state.kudos.iter().filter(|k| k.to_user_id == user_id).count()),
            kudos_sent: count(state.kudos.iter().filter(|k| k.from_user_id == user_id).count()),
            code_reviews: github.reviews,
            pull_requests: github.pull_requests,
            issues_closed: github.issues_closed,
            streak_days: streak_days(&activity, now),
            tenure_days: tenure_days(user.created_at, now),
            github_commits: github.commits,
            github_prs: github.pull_requests,
            github_reviews: github.reviews,
            peer_awards_received: count(
                state.peer_grants.iter().filter(|g| g.to_user_id == user_id).count(),
            ),
            peer_awards_given: count(
                state.peer_grants.iter().filter(|g| g.from_user_id == user_id).count(),
            ),
            total_badges: count(state.awards.values().filter(|a| a.user_id == user_id).count()),
        })
    }
}

#[async_trait]
impl PeerGrantRepositoryTrait for InMemoryStore {
    async fn count_grants_in_year(&self, from_user_id: i64, year: i32) -> Result<u32> {
        self.ensure_available()?;
        Ok(self.state.read().grants_in_year(from_user_id, year))
    }

    async fn record_grant_within_quota(
        &self,
        grant: &NewPeerGrant,
        quota: u32,
    ) -> Result<PeerGrantInsert> {
        self.ensure_available()?;
        let mut state = self.state.write();
        let used = state.grants_in_year(grant.from_user_id, grant.year());
        if used >= quota {
            return Ok(PeerGrantInsert::QuotaExhausted { used });
        }

        let recorded = PeerGrant {
            id: state.next_id(),
            from_user_id: grant.from_user_id,
            to_user_id: grant.to_user_id,
            message: grant.message.clone(),
            granted_at: grant.granted_at,
        };
        state.peer_grants.push(recorded.clone());
        Ok(PeerGrantInsert::Recorded(recorded))
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        self.ensure_available()?;
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.ensure_available()?;
        let state = self.state.read();
        Ok(state
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>> {
        self.ensure_available()?;
        let state = self.state.read();
        Ok(ids.iter().filter_map(|id| state.users.get(id)).cloned().collect())
    }

    async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>> {
        self.ensure_available()?;
        let state = self.state.read();
        let mut rows: Vec<(UserRecord, i64)> = state
            .users
            .values()
            .map(|u| {
                let count = i64::try_from(state.tally(kind, u.id)).unwrap_or(i64::MAX);
                (u.clone(), count)
            })
            .collect();
        rows.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then(a.id.cmp(&b.id)));
        rows.truncate(limit_len(limit));
        Ok(LeaderboardEntry::ranked(rows))
    }
}

#[async_trait]
impl KudoRepositoryTrait for InMemoryStore {
    async fn create(&self, kudo: &NewKudo) -> Result<Kudo> {
        self.ensure_available()?;
        let mut state = self.state.write();
        let saved = Kudo {
            id: state.next_id(),
            from_user_id: kudo.from_user_id,
            to_user_id: kudo.to_user_id,
            message: kudo.message.clone(),
            category: kudo.category.clone(),
            is_public: kudo.is_public,
            created_at: kudo.created_at,
        };
        state.kudos.push(saved.clone());
        Ok(saved)
    }

    async fn list_public(&self, limit: u32, before: Option<i64>) -> Result<Vec<Kudo>> {
        self.ensure_available()?;
        let state = self.state.read();
        let cursor = match before {
            Some(id) => match state.kudos.iter().find(|k| k.id == id) {
                Some(k) => Some((k.created_at, k.id)),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        Ok(state
            .kudos_newest_first()
            .into_iter()
            .filter(|k| k.is_public)
            .filter(|k| cursor.is_none_or(|c| (k.created_at, k.id) < c))
            .take(limit_len(limit))
            .cloned()
            .collect())
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        direction: KudoDirection,
        include_private: bool,
        limit: u32,
    ) -> Result<Vec<Kudo>> {
        self.ensure_available()?;
        let state = self.state.read();
        Ok(state
            .kudos_newest_first()
            .into_iter()
            .filter(|k| {
                (direction.includes_received() && k.to_user_id == user_id)
                    || (direction.includes_sent() && k.from_user_id == user_id)
            })
            .filter(|k| include_private || k.is_public)
            .take(limit_len(limit))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BadgeTier;
    use chrono::{Duration, TimeZone};

    fn new_badge(slug: &str, kind: TriggerKind, threshold: Option<i32>) -> NewBadgeDefinition {
        NewBadgeDefinition {
            slug: slug.to_string(),
            name: slug.to_string(),
            description: String::new(),
            tier: BadgeTier::Bronze,
            category: "test".to_string(),
            trigger_kind: kind,
            threshold,
            is_active: true,
        }
    }

    fn new_award(user_id: i64, badge_id: i64, at: DateTime<Utc>) -> NewAward {
        NewAward {
            user_id,
            badge_id,
            awarded_by: "system".to_string(),
            reason: None,
            awarded_at: at,
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_unique() {
        let store = InMemoryStore::new();
        let user = store.add_user("ana", None, Utc::now());
        let badge = store
            .upsert(&new_badge("first-pr", TriggerKind::PullRequests, Some(1)))
            .await
            .unwrap();

        let first = store.insert_if_absent(&new_award(user.id, badge.id, Utc::now())).await.unwrap();
        let second = store.insert_if_absent(&new_award(user.id, badge.id, Utc::now())).await.unwrap();

        assert!(matches!(first, InsertOutcome::Inserted(_)));
        assert_eq!(second, InsertOutcome::AlreadyExists);
        assert_eq!(store.award_count(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_id() {
        let store = InMemoryStore::new();
        let first = store
            .upsert(&new_badge("mvp", TriggerKind::Manual, None))
            .await
            .unwrap();
        let mut changed = new_badge("mvp", TriggerKind::Manual, None);
        changed.name = "Most Valuable".to_string();
        let second = store.upsert(&changed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Most Valuable");
        assert_eq!(store.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_unheld_automatic_excludes_manual_held_and_inactive() {
        let store = InMemoryStore::new();
        let user = store.add_user("ana", None, Utc::now());
        let held = store
            .upsert(&new_badge("first-pr", TriggerKind::PullRequests, Some(1)))
            .await
            .unwrap();
        store.upsert(&new_badge("mvp", TriggerKind::Manual, None)).await.unwrap();
        let mut inactive = new_badge("old", TriggerKind::KudosSent, Some(1));
        inactive.is_active = false;
        store.upsert(&inactive).await.unwrap();
        let open = store
            .upsert(&new_badge("team-spirit", TriggerKind::KudosReceived, Some(50)))
            .await
            .unwrap();
        store.insert_if_absent(&new_award(user.id, held.id, Utc::now())).await.unwrap();

        let unheld = store.list_unheld_automatic(user.id, None).await.unwrap();
        assert_eq!(unheld.iter().map(|b| b.id).collect::<Vec<_>>(), vec![open.id]);

        let narrowed = store
            .list_unheld_automatic(user.id, Some(TriggerKind::PullRequests))
            .await
            .unwrap();
        assert!(narrowed.is_empty());
    }

    #[tokio::test]
    async fn test_quota_window_is_calendar_year() {
        let store = InMemoryStore::new();
        let grant = |at: DateTime<Utc>| NewPeerGrant {
            from_user_id: 1,
            to_user_id: 2,
            message: "Great pairing session".to_string(),
            granted_at: at,
        };
        let dec = Utc.with_ymd_and_hms(2025, 12, 31, 22, 0, 0).unwrap();

        for _ in 0..2 {
            let result = store.record_grant_within_quota(&grant(dec), 2).await.unwrap();
            assert!(matches!(result, PeerGrantInsert::Recorded(_)));
        }
        let third = store.record_grant_within_quota(&grant(dec), 2).await.unwrap();
        assert_eq!(third, PeerGrantInsert::QuotaExhausted { used: 2 });

        let jan = dec + Duration::hours(3);
        let next_year = store.record_grant_within_quota(&grant(jan), 2).await.unwrap();
        assert!(matches!(next_year, PeerGrantInsert::Recorded(_)));
        assert_eq!(store.count_grants_in_year(1, 2025).await.unwrap(), 2);
        assert_eq!(store.count_grants_in_year(1, 2026).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counters_aggregate() {
        let store = InMemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let ana = store.add_user("ana", None, now - Duration::days(400));
        let ben = store.add_user("ben", None, now);
        store.set_github_stats(
            ana.id,
            GithubStats {
                commits: 40,
                pull_requests: 12,
                reviews: 7,
                issues_closed: 3,
            },
        );
        for _ in 0..3 {
            store
                .create(&NewKudo {
                    from_user_id: ben.id,
                    to_user_id: ana.id,
                    message: "thanks!".to_string(),
                    category: None,
                    is_public: true,
                    created_at: now,
                })
                .await
                .unwrap();
        }

        let counters = store.fetch_counters(ana.id, now).await.unwrap();
        assert_eq!(counters.kudos_received, 3);
        assert_eq!(counters.kudos_sent, 0);
        assert_eq!(counters.pull_requests, 12);
        assert_eq!(counters.github_prs, 12);
        assert_eq!(counters.code_reviews, 7);
        assert_eq!(counters.github_commits, 40);
        assert_eq!(counters.tenure_days, 400);

        let ben_counters = store.fetch_counters(ben.id, now).await.unwrap();
        assert_eq!(ben_counters.kudos_sent, 3);
        assert_eq!(store.fetch_counters(999, now).await.unwrap(), UserCounters::default());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_hard() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        let err = store.find_by_slug("mvp").await.unwrap_err();
        assert!(matches!(err, EngineError::StoreUnavailable(_)));

        store.set_unavailable(false);
        assert!(store.find_by_slug("mvp").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_username_is_case_insensitive() {
        let store = InMemoryStore::new();
        let user = store.add_user("OctoCat", None, Utc::now());
        let found = store.find_by_username("octocat").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    fn new_kudo(from: i64, to: i64, is_public: bool, at: DateTime<Utc>) -> NewKudo {
        NewKudo {
            from_user_id: from,
            to_user_id: to,
            message: "thanks for the help".to_string(),
            category: None,
            is_public,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_leaderboard_orders_by_count_then_id() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let ana = store.add_user("ana", None, now);
        let ben = store.add_user("ben", None, now);
        let cy = store.add_user("cy", None, now);
        store.create(&new_kudo(ana.id, cy.id, true, now)).await.unwrap();
        store.create(&new_kudo(ben.id, cy.id, false, now)).await.unwrap();
        store.create(&new_kudo(cy.id, ben.id, true, now)).await.unwrap();

        let received = store.leaderboard(LeaderboardKind::KudosReceived, 10).await.unwrap();
        let ranked: Vec<_> = received.iter().map(|e| (e.rank, e.user.id, e.count)).collect();
        assert_eq!(ranked, vec![(1, cy.id, 2), (2, ben.id, 1), (3, ana.id, 0)]);

        let sent = store.leaderboard(LeaderboardKind::KudosSent, 2).await.unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].user.id, ana.id);
        assert_eq!(sent[0].count, 1);
    }

    #[tokio::test]
    async fn test_list_public_pages_newest_first() {
        let store = InMemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let ana = store.add_user("ana", None, now);
        let ben = store.add_user("ben", None, now);
        let mut public = Vec::new();
        for minutes in 0..3 {
            let kudo = store
                .create(&new_kudo(ana.id, ben.id, true, now + Duration::minutes(minutes)))
                .await
                .unwrap();
            public.push(kudo.id);
        }
        store.create(&new_kudo(ana.id, ben.id, false, now + Duration::hours(1))).await.unwrap();

        let first = store.list_public(2, None).await.unwrap();
        assert_eq!(first.iter().map(|k| k.id).collect::<Vec<_>>(), vec![public[2], public[1]]);

        let second = store.list_public(2, Some(public[1])).await.unwrap();
        assert_eq!(second.iter().map(|k| k.id).collect::<Vec<_>>(), vec![public[0]]);

        assert!(store.list_public(2, Some(9999)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_for_user_direction_and_privacy() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let ana = store.add_user("ana", None, now);
        let ben = store.add_user("ben", None, now);
        store.create(&new_kudo(ana.id, ben.id, true, now)).await.unwrap();
        store.create(&new_kudo(ana.id, ben.id, false, now)).await.unwrap();
        store.create(&new_kudo(ben.id, ana.id, true, now)).await.unwrap();

        let received = store
            .list_for_user(ben.id, KudoDirection::Received, false, 50)
            .await
            .unwrap();
        assert_eq!(received.len(), 1);

        let with_private = store
            .list_for_user(ben.id, KudoDirection::Received, true, 50)
            .await
            .unwrap();
        assert_eq!(with_private.len(), 2);

        let all = store.list_for_user(ben.id, KudoDirection::All, true, 50).await.unwrap();
        assert_eq!(all.len(), 3);

        let sent = store.list_for_user(ben.id, KudoDirection::Sent, false, 50).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_user_id, ana.id);
    }
}
