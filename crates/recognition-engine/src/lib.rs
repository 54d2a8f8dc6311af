//! 徽章认可引擎
//!
//! 根据用户累计的活动计数器判断其新满足条件的徽章，并维护"一次性发放"与
//! "同伴徽章年度限额"两条不变式。
//!
//! ## 核心功能
//!
//! - **触发器评估**：纯函数，按触发类型读取计数器并与阈值比较
//! - **徽章发放协调**：全量/单触发评估、手动发放、撤销、进度查询
//! - **同伴徽章限额**：每位发放人每个自然年限额发放，按层级自动授予社区徽章
//! - **通知发送**：发放后的异步通知，失败仅记录日志
//! - **管理员名单**：可注入、可显式重载的权限注册表
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误与业务拒绝类型
//! - `evaluator`: 触发器评估
//! - `catalog`: 内置徽章目录
//! - `clock`: 时间来源抽象
//! - `repository`: 仓储层（PostgreSQL 与内存实现）
//! - `service`: 业务服务层
//! - `notification`: 通知服务模块
//! - `permission`: 管理员权限注册表

pub mod catalog;
pub mod clock;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod notification;
pub mod permission;
pub mod repository;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{EngineError, Rejection, Result};
pub use evaluator::TriggerEvaluator;
pub use models::*;
pub use notification::{
    LogChannel, MemoryChannel, Notification, NotificationChannel, NotificationKind,
    NotificationSender, PgNotificationChannel,
};
pub use permission::{AdminEntry, AdminRegistry, AdminRegistryWatcher, AdminSettings, Permission};
pub use repository::{InMemoryStore, Repositories};
pub use service::{
    AwardService, FEED_LIMIT_DEFAULT, KudoRequest, KudosService, LEADERBOARD_LIMIT_DEFAULT,
    PeerAwardPolicy, PeerAwardService, dto,
};
