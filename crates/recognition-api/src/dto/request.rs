//! 请求 DTO 定义
//!
//! 字段格式校验使用 validator；业务规则（留言长度、限额等）由引擎判定。

use serde::Deserialize;
use validator::Validate;

use recognition_engine::PatronTier;

/// 触发评估请求
///
/// 未指定用户名时评估当前用户
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[validate(length(min = 1, max = 100, message = "用户名长度必须在1-100个字符之间"))]
    pub username: Option<String>,
}

/// 进度查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub username: Option<String>,
}

/// 手动发放请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AwardBadgeRequest {
    #[validate(length(min = 1, max = 100, message = "用户名长度必须在1-100个字符之间"))]
    pub to_username: String,
    #[validate(length(min = 1, max = 100, message = "徽章标识长度必须在1-100个字符之间"))]
    pub badge_slug: String,
    #[validate(length(max = 500, message = "发放原因不能超过500个字符"))]
    pub reason: Option<String>,
}

/// 撤销请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevokeBadgeRequest {
    #[validate(length(min = 1, max = 100, message = "用户名长度必须在1-100个字符之间"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "徽章标识长度必须在1-100个字符之间"))]
    pub badge_slug: String,
}

/// 赞助徽章发放请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatronAwardRequest {
    #[validate(length(min = 1, max = 100, message = "用户名长度必须在1-100个字符之间"))]
    pub username: String,
    pub tier: PatronTier,
    #[validate(length(max = 200, message = "支付凭证不能超过200个字符"))]
    pub payment_reference: Option<String>,
    #[validate(length(max = 200, message = "影响方向不能超过200个字符"))]
    pub impact_choice: Option<String>,
}

/// 同伴徽章请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PeerAwardRequest {
    #[validate(length(min = 1, max = 100, message = "用户名长度必须在1-100个字符之间"))]
    pub to_username: String,
    pub message: String,
}

/// 感谢请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KudoCreateRequest {
    #[validate(length(min = 1, max = 100, message = "用户名长度必须在1-100个字符之间"))]
    pub to_username: String,
    pub message: String,
    #[validate(length(max = 50, message = "分类不能超过50个字符"))]
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

/// 排行榜查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// badges | kudos_received | kudos_sent
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<u32>,
}

/// 感谢动态查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KudoFeedQuery {
    pub limit: Option<u32>,
    /// 上一页返回的 nextCursor
    pub cursor: Option<i64>,
}

/// 用户感谢查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserKudosQuery {
    /// received | sent | all
    #[serde(rename = "type")]
    pub direction: Option<String>,
}
