//! 感谢（kudo）服务
//!
//! 记录感谢后立即对接收人的 KUDOS_RECEIVED 与发送人的 KUDOS_SENT 做单触发评估，
//! 并通知接收人。另提供公开动态与单个用户的感谢列表。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::{Rejection, Result};
use crate::models::{Kudo, KudoDirection, NewKudo, TriggerKind, UserRecord};
use crate::service::award_service::AwardService;
use crate::service::dto::{KudoFeed, KudoOutcome, KudoStats, KudoView, UserKudos};

/// 留言字符数范围
pub const KUDO_MESSAGE_MIN: usize = 3;
pub const KUDO_MESSAGE_MAX: usize = 500;

/// 动态默认与最大条数
pub const FEED_LIMIT_DEFAULT: u32 = 20;
pub const FEED_LIMIT_MAX: u32 = 100;

/// 用户感谢列表的条数
pub const USER_KUDOS_LIMIT: u32 = 50;

/// 感谢请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KudoRequest {
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub message: String,
    pub category: Option<String>,
    pub is_public: bool,
}

/// 感谢服务
pub struct KudosService {
    awards: Arc<AwardService>,
}

impl KudosService {
    pub fn new(awards: Arc<AwardService>) -> Self {
        Self { awards }
    }

    /// 记录感谢
    ///
    /// 不检查发送人与接收人是否相同，由调用方负责。
    #[instrument(skip(self, request), fields(from = request.from_user_id, to = request.to_user_id))]
    pub async fn record_kudo(
        &self,
        request: KudoRequest,
    ) -> Result<std::result::Result<KudoOutcome, Rejection>> {
        let message = request.message.trim();
        let len = message.chars().count();
        if !(KUDO_MESSAGE_MIN..=KUDO_MESSAGE_MAX).contains(&len) {
            return Ok(Err(Rejection::validation(format!(
                "Message must be between {KUDO_MESSAGE_MIN} and {KUDO_MESSAGE_MAX} characters"
            ))));
        }

        let repos = self.awards.repositories();
        if repos.users.find_by_id(request.to_user_id).await?.is_none() {
            return Ok(Err(Rejection::UserNotFound {
                user_id: request.to_user_id,
            }));
        }
        let Some(sender) = repos.users.find_by_id(request.from_user_id).await? else {
            return Ok(Err(Rejection::UserNotFound {
                user_id: request.from_user_id,
            }));
        };

        let kudo = repos
            .kudos
            .create(&NewKudo {
                from_user_id: request.from_user_id,
                to_user_id: request.to_user_id,
                message: message.to_string(),
                category: request.category.clone(),
                is_public: request.is_public,
                created_at: self.awards.now(),
            })
            .await?;
        info!(kudo_id = kudo.id, "感谢已记录");

        let mut new_badges = self
            .awards
            .evaluate_single_trigger(request.to_user_id, TriggerKind::KudosReceived)
            .await?;
        new_badges.extend(
            self.awards
                .evaluate_single_trigger(request.from_user_id, TriggerKind::KudosSent)
                .await?,
        );

        self.awards.notifier().send_kudo_received(
            request.to_user_id,
            kudo.id,
            sender.label(),
            &kudo.message,
        );

        Ok(Ok(KudoOutcome { kudo, new_badges }))
    }

    /// 公开感谢动态，按时间倒序分页
    #[instrument(skip(self))]
    pub async fn kudos_feed(&self, limit: u32, before: Option<i64>) -> Result<KudoFeed> {
        let limit = limit.clamp(1, FEED_LIMIT_MAX);
        let kudos = self
            .awards
            .repositories()
            .kudos
            .list_public(limit, before)
            .await?;

        let next_cursor = if kudos.len() == usize::try_from(limit).unwrap_or(usize::MAX) {
            kudos.last().map(|k| k.id)
        } else {
            None
        };
        Ok(KudoFeed {
            kudos: self.with_users(kudos).await?,
            next_cursor,
        })
    }

    /// 用户收到/发出的感谢与计数
    ///
    /// 私密感谢仅在 `include_private` 时返回；计数包含私密感谢。
    #[instrument(skip(self, user, direction), fields(user_id = user.id, direction = direction.as_str()))]
    pub async fn user_kudos(
        &self,
        user: UserRecord,
        direction: KudoDirection,
        include_private: bool,
    ) -> Result<UserKudos> {
        let repos = self.awards.repositories();
        let kudos = repos
            .kudos
            .list_for_user(user.id, direction, include_private, USER_KUDOS_LIMIT)
            .await?;
        let counters = repos.counters.fetch_counters(user.id, self.awards.now()).await?;

        Ok(UserKudos {
            user,
            direction,
            kudos: self.with_users(kudos).await?,
            stats: KudoStats {
                received: counters.kudos_received,
                sent: counters.kudos_sent,
            },
        })
    }

    /// 批量补齐发送人与接收人
    async fn with_users(&self, kudos: Vec<Kudo>) -> Result<Vec<KudoView>> {
        let mut ids: Vec<i64> = kudos
            .iter()
            .flat_map(|k| [k.from_user_id, k.to_user_id])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let users: HashMap<i64, UserRecord> = self
            .awards
            .repositories()
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(kudos
            .into_iter()
            .filter_map(|kudo| {
                let from = users.get(&kudo.from_user_id)?.clone();
                let to = users.get(&kudo.to_user_id)?.clone();
                Some(KudoView { kudo, from, to })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::notification::NotificationSender;
    use crate::repository::{InMemoryStore, Repositories};
    use chrono::Utc;

    fn request(from: i64, to: i64, message: &str) -> KudoRequest {
        KudoRequest {
            from_user_id: from,
            to_user_id: to,
            message: message.to_string(),
            category: Some("teamwork".to_string()),
            is_public: true,
        }
    }

    fn service(store: Arc<InMemoryStore>) -> KudosService {
        let awards = AwardService::new(
            Repositories::in_memory(store),
            NotificationSender::log_only(),
            Arc::new(SystemClock),
        );
        KudosService::new(Arc::new(awards))
    }

    #[tokio::test]
    async fn test_message_length_bounds() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(store);

        let too_short = service.record_kudo(request(1, 2, " hi ")).await.unwrap();
        assert!(matches!(too_short, Err(Rejection::Validation { .. })));

        let too_long = service
            .record_kudo(request(1, 2, &"x".repeat(501)))
            .await
            .unwrap();
        assert!(matches!(too_long, Err(Rejection::Validation { .. })));
    }

    #[tokio::test]
    async fn test_unknown_recipient() {
        let store = Arc::new(InMemoryStore::new());
        let sender = store.add_user("ana", None, Utc::now());
        let service = service(store);

        let result = service.record_kudo(request(sender.id, 404, "thanks!")).await.unwrap();
        assert_eq!(result, Err(Rejection::UserNotFound { user_id: 404 }));
    }

    #[tokio::test]
    async fn test_record_kudo_persists_trimmed_message() {
        let store = Arc::new(InMemoryStore::new());
        let ana = store.add_user("ana", Some("Ana"), Utc::now());
        let ben = store.add_user("ben", None, Utc::now());
        let service = service(store.clone());

        let outcome = service
            .record_kudo(request(ana.id, ben.id, "  great pairing  "))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.kudo.message, "great pairing");
        assert!(outcome.new_badges.is_empty());
    }

    #[tokio::test]
    async fn test_feed_next_cursor_only_on_full_page() {
        let store = Arc::new(InMemoryStore::new());
        let ana = store.add_user("ana", Some("Ana"), Utc::now());
        let ben = store.add_user("ben", None, Utc::now());
        let service = service(store);
        for _ in 0..3 {
            service
                .record_kudo(request(ana.id, ben.id, "thanks for the review"))
                .await
                .unwrap()
                .unwrap();
        }

        let page = service.kudos_feed(2, None).await.unwrap();
        assert_eq!(page.kudos.len(), 2);
        assert_eq!(page.kudos[0].from.username, "ana");
        assert_eq!(page.kudos[0].to.username, "ben");
        let cursor = page.next_cursor.unwrap();
        assert_eq!(cursor, page.kudos[1].kudo.id);

        let rest = service.kudos_feed(2, Some(cursor)).await.unwrap();
        assert_eq!(rest.kudos.len(), 1);
        assert!(rest.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_user_kudos_stats_count_private() {
        let store = Arc::new(InMemoryStore::new());
        let ana = store.add_user("ana", None, Utc::now());
        let ben = store.add_user("ben", None, Utc::now());
        let service = service(store);
        let mut private = request(ana.id, ben.id, "quiet thanks");
        private.is_public = false;
        service.record_kudo(private).await.unwrap().unwrap();
        service
            .record_kudo(request(ana.id, ben.id, "public thanks"))
            .await
            .unwrap()
            .unwrap();

        let public_view = service
            .user_kudos(ben.clone(), KudoDirection::Received, false)
            .await
            .unwrap();
        assert_eq!(public_view.kudos.len(), 1);
        assert_eq!(public_view.stats, KudoStats { received: 2, sent: 0 });

        let own_view = service.user_kudos(ben, KudoDirection::Received, true).await.unwrap();
        assert_eq!(own_view.kudos.len(), 2);
    }
}
