//! 服务层
//!
//! 协调仓储、触发器评估与通知，实现徽章认可的业务规则。
//!
//! ## 模块结构
//!
//! - `dto`: 服务结果对象
//! - `award_service`: 徽章评估、发放、撤销与进度
//! - `peer_award_service`: 同伴徽章限额
//! - `kudos_service`: 感谢记录及其触发的评估、感谢动态

pub mod award_service;
pub mod dto;
pub mod kudos_service;
pub mod peer_award_service;

pub use award_service::{AwardService, LEADERBOARD_LIMIT_DEFAULT};
pub use dto::*;
pub use kudos_service::{FEED_LIMIT_DEFAULT, KudoRequest, KudosService};
pub use peer_award_service::{PeerAwardPolicy, PeerAwardService};
