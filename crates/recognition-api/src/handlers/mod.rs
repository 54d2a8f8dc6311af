//! 请求处理器
//!
//! 处理器只负责身份、权限与参数解析，业务规则全部委托给引擎服务。

pub mod admin;
pub mod badge;
pub mod kudos;
pub mod leaderboard;
pub mod peer_award;

use axum::Json;

use recognition_engine::dto::AwardResult;
use recognition_engine::{Permission, UserRecord};

use crate::dto::ApiResponse;
use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 存活探针
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "recognition-api"
    }))
}

/// 按用户名查找用户，不存在返回 404
pub(crate) async fn resolve_user(state: &AppState, username: &str) -> Result<UserRecord> {
    state
        .users()
        .find_by_username(username.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("用户不存在: {username}")))
}

/// 校验当前用户持有指定权限
pub(crate) fn require_permission(
    state: &AppState,
    current: &CurrentUser,
    permission: Permission,
) -> Result<()> {
    if state.admins.has_permission(&current.username, permission) {
        Ok(())
    } else {
        tracing::warn!(
            username = %current.username,
            permission = permission.as_str(),
            "权限不足"
        );
        Err(ApiError::Forbidden(format!("缺少权限: {}", permission.as_str())))
    }
}

/// 被拒绝的发放结果转换为错误响应
pub(crate) fn award_response(result: AwardResult) -> Result<Json<ApiResponse<AwardResult>>> {
    match result.rejection.clone() {
        Some(rejection) => Err(ApiError::Rejected(rejection)),
        None => Ok(Json(ApiResponse::success(result))),
    }
}
