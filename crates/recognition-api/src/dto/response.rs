//! 响应 DTO 定义

use serde::Serialize;

use recognition_engine::dto::{AwardResult, BadgeProgress};
use recognition_engine::{AdminEntry, AdminSettings, UserCounters};

/// 统一 API 响应格式
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 评估结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub username: String,
    /// 本次新发放的数量
    pub awarded: usize,
    pub results: Vec<AwardResult>,
}

/// 进度查询结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub username: String,
    pub progress: Vec<BadgeProgress>,
    pub counters: UserCounters,
    /// 最接近达成的徽章（最多 5 个）
    pub next_badges: Vec<BadgeProgress>,
}

/// 同伴徽章发放结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAwardResponse {
    pub result: AwardResult,
    pub remaining: u32,
}

/// 管理员名单
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListResponse {
    pub admins: Vec<AdminEntry>,
    pub settings: AdminSettings,
}

/// 名单重载结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub admin_count: usize,
}
