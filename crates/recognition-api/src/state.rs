//! 应用状态管理
//!
//! 定义在 handlers 之间共享的应用状态

use std::sync::Arc;

use recognition_engine::repository::UserRepositoryTrait;
use recognition_engine::{AdminRegistry, AwardService, KudosService, PeerAwardPolicy, PeerAwardService};

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub awards: Arc<AwardService>,
    pub peer_awards: Arc<PeerAwardService>,
    pub kudos: Arc<KudosService>,
    pub admins: Arc<AdminRegistry>,
}

impl AppState {
    pub fn new(awards: Arc<AwardService>, policy: PeerAwardPolicy, admins: Arc<AdminRegistry>) -> Self {
        Self {
            peer_awards: Arc::new(PeerAwardService::new(awards.clone(), policy)),
            kudos: Arc::new(KudosService::new(awards.clone())),
            awards,
            admins,
        }
    }

    /// 用户仓储
    pub fn users(&self) -> &Arc<dyn UserRepositoryTrait> {
        &self.awards.repositories().users
    }
}
