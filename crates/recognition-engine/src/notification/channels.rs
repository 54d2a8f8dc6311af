//! 通知渠道
//!
//! 渠道实现应当无状态或内部同步，便于在多个发送任务中并发调用。

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;
use tracing::info;

use super::types::Notification;
use crate::error::{EngineError, Result};

/// 通知渠道 trait
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 渠道名称（用于日志与指标标签）
    fn name(&self) -> &str;

    /// 投递通知
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// 仅输出日志的渠道
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        info!(
            notification_id = %notification.notification_id,
            user_id = notification.user_id,
            kind = notification.kind.as_str(),
            title = %notification.title,
            "通知已生成"
        );
        Ok(())
    }
}

/// 写入 notifications 表的渠道
#[derive(Clone)]
pub struct PgNotificationChannel {
    pool: PgPool,
}

impl PgNotificationChannel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationChannel for PgNotificationChannel {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, body, data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&notification.notification_id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.data)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// 保存在内存中的渠道，可模拟投递失败
#[derive(Default)]
pub struct MemoryChannel {
    delivered: Mutex<Vec<Notification>>,
    failing: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次投递都返回错误
    pub fn failing() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// 已投递的通知快照
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl NotificationChannel for MemoryChannel {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        if self.failing {
            return Err(EngineError::Internal("通知渠道不可用".to_string()));
        }
        self.delivered.lock().push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;

    #[tokio::test]
    async fn test_memory_channel_records() {
        let channel = MemoryChannel::new();
        let n = Notification::new(1, NotificationKind::BadgeEarned, "title", "body");
        channel.deliver(&n).await.unwrap();
        assert_eq!(channel.delivered(), vec![n]);
    }

    #[tokio::test]
    async fn test_failing_channel() {
        let channel = MemoryChannel::failing();
        let n = Notification::new(1, NotificationKind::BadgeEarned, "title", "body");
        assert!(channel.deliver(&n).await.is_err());
        assert!(channel.delivered().is_empty());
        assert!(LogChannel.deliver(&n).await.is_ok());
    }
}
