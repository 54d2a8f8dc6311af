//! 管理员名单 API 处理器

use axum::{Extension, Json, extract::State};
use tracing::info;

use recognition_engine::Permission;

use crate::dto::{AdminListResponse, ApiResponse, ReloadResponse};
use crate::error::Result;
use crate::handlers::require_permission;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 当前管理员名单
///
/// GET /api/admin/admins
pub async fn list_admins(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<AdminListResponse>>> {
    require_permission(&state, &current, Permission::ManageAdmins)?;

    Ok(Json(ApiResponse::success(AdminListResponse {
        admins: state.admins.admins(),
        settings: state.admins.settings(),
    })))
}

/// 重新加载管理员名单
///
/// POST /api/admin/admins/reload
///
/// 文件格式错误时返回 400 并保留当前名单
pub async fn reload_admins(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ReloadResponse>>> {
    require_permission(&state, &current, Permission::ManageAdmins)?;

    let admin_count = state.admins.reload()?;
    info!(requested_by = %current.username, admin_count, "管理员名单已重载");
    Ok(Json(ApiResponse::success(ReloadResponse { admin_count })))
}
