//! 通知模块
//!
//! 徽章发放、进度里程碑与收到感谢时生成通知，异步投递到注入的渠道。
//! 投递失败只记录日志，不影响发放结果。

mod channels;
mod sender;
mod types;

pub use channels::{LogChannel, MemoryChannel, NotificationChannel, PgNotificationChannel};
pub use sender::NotificationSender;
pub use types::{Notification, NotificationKind, PROGRESS_MILESTONES, message_preview};
