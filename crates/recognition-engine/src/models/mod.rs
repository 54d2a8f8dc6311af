//! 认可引擎领域模型
//!
//! 包含徽章目录、持有记录、计数器与用户等核心实体定义

pub mod award;
pub mod badge;
pub mod counters;
pub mod enums;
pub mod user;

pub use award::{
    Award, InsertOutcome, NewAward, NewPeerGrant, PeerGrant, PeerGrantInsert, SYSTEM_ACTOR,
    year_bounds,
};
pub use badge::{BadgeDefinition, BadgeSummary, NewBadgeDefinition};
pub use counters::{
    STREAK_LOOKBACK, UserCounters, progress_percentage, progress_target, streak_days, tenure_days,
};
pub use enums::{BadgeTier, KudoDirection, LeaderboardKind, PatronTier, TriggerKind};
pub use user::{GithubStats, Kudo, LeaderboardEntry, NewKudo, UserRecord};
