//! 数据仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 唯一约束（每个用户每枚徽章一条）与限额临界区由存储层保证
//! - 定义 trait 接口以支持 mock 测试与内存实现

mod award_repo;
mod badge_repo;
mod counter_repo;
mod memory;
mod peer_grant_repo;
mod traits;
mod user_repo;

use std::sync::Arc;

use sqlx::PgPool;

pub use award_repo::AwardRepository;
pub use badge_repo::BadgeRepository;
pub use counter_repo::CounterRepository;
pub use memory::InMemoryStore;
pub use peer_grant_repo::PeerGrantRepository;
pub use traits::*;
pub use user_repo::{KudoRepository, UserRepository};

/// 服务层使用的仓储集合
#[derive(Clone)]
pub struct Repositories {
    pub badges: Arc<dyn BadgeRepositoryTrait>,
    pub awards: Arc<dyn AwardRepositoryTrait>,
    pub counters: Arc<dyn CounterRepositoryTrait>,
    pub peer_grants: Arc<dyn PeerGrantRepositoryTrait>,
    pub users: Arc<dyn UserRepositoryTrait>,
    pub kudos: Arc<dyn KudoRepositoryTrait>,
}

impl Repositories {
    /// PostgreSQL 实现
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            badges: Arc::new(BadgeRepository::new(pool.clone())),
            awards: Arc::new(AwardRepository::new(pool.clone())),
            counters: Arc::new(CounterRepository::new(pool.clone())),
            peer_grants: Arc::new(PeerGrantRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            kudos: Arc::new(KudoRepository::new(pool)),
        }
    }

    /// 进程内实现，所有仓储共享同一份状态
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            badges: store.clone(),
            awards: store.clone(),
            counters: store.clone(),
            peer_grants: store.clone(),
            users: store.clone(),
            kudos: store,
        }
    }
}
