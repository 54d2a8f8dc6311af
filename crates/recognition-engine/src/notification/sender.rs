//! 通知发送器
//!
//! 业务服务通过 `NotificationSender` 发送通知：每条通知在独立任务中投递
//! （fire-and-forget），失败只记录日志与指标。

use std::sync::Arc;

use tracing::{error, info};

use recognition_shared::observability::metrics as app_metrics;

use super::channels::{LogChannel, NotificationChannel};
use super::types::Notification;
use crate::models::BadgeSummary;

/// 通知发送器
#[derive(Clone)]
pub struct NotificationSender {
    channel: Arc<dyn NotificationChannel>,
}

impl NotificationSender {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    /// 仅输出日志的发送器
    pub fn log_only() -> Self {
        Self::new(Arc::new(LogChannel))
    }

    /// 发送徽章获得通知
    pub fn send_badge_earned(&self, user_id: i64, badge: &BadgeSummary) {
        self.send_async(Notification::badge_earned(user_id, badge));
    }

    /// 发送进度里程碑通知
    pub fn send_badge_progress(
        &self,
        user_id: i64,
        badge: &BadgeSummary,
        progress: i64,
        target: i64,
        percentage: u8,
    ) {
        self.send_async(Notification::badge_progress(
            user_id, badge, progress, target, percentage,
        ));
    }

    /// 发送收到感谢通知
    pub fn send_kudo_received(&self, user_id: i64, kudo_id: i64, from_label: &str, message: &str) {
        self.send_async(Notification::kudo_received(
            user_id, kudo_id, from_label, message,
        ));
    }

    /// 发送收到同伴徽章通知
    pub fn send_peer_award_received(&self, user_id: i64, from_label: &str, message: &str) {
        self.send_async(Notification::peer_award_received(
            user_id, from_label, message,
        ));
    }

    /// 异步发送通知（fire-and-forget）
    fn send_async(&self, notification: Notification) {
        let channel = self.channel.clone();

        tokio::spawn(async move {
            let channel_name = channel.name().to_string();
            match channel.deliver(&notification).await {
                Ok(()) => {
                    app_metrics::record_notification(&channel_name, "delivered");
                    info!(
                        notification_id = %notification.notification_id,
                        user_id = notification.user_id,
                        kind = notification.kind.as_str(),
                        channel = %channel_name,
                        "通知发送成功"
                    );
                }
                Err(e) => {
                    app_metrics::record_notification(&channel_name, "failed");
                    error!(
                        notification_id = %notification.notification_id,
                        user_id = notification.user_id,
                        channel = %channel_name,
                        error = %e,
                        "通知发送失败"
                    );
                }
            }
        });
    }
}
