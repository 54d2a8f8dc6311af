//! 徽章 API 处理器
//!
//! 目录与持有查询、自动评估、进度、手动发放/撤销、赞助徽章。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use tracing::info;
use validator::Validate;

use recognition_engine::dto::{AwardResult, HeldBadge, RevokeResult};
use recognition_engine::{BadgeDefinition, Permission};

use crate::dto::{
    ApiResponse, AwardBadgeRequest, EvaluateRequest, EvaluateResponse, PatronAwardRequest,
    ProgressQuery, ProgressResponse, RevokeBadgeRequest,
};
use crate::error::{ApiError, Result};
use crate::handlers::{award_response, require_permission, resolve_user};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 进度响应中的"下一个目标"数量
const NEXT_BADGES_LIMIT: usize = 5;

/// 启用中的徽章目录
///
/// GET /api/badges
pub async fn list_badges(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BadgeDefinition>>>> {
    let badges = state.awards.list_catalog().await?;
    Ok(Json(ApiResponse::success(badges)))
}

/// 用户持有的徽章
///
/// GET /api/badges/user/{username}
pub async fn list_user_badges(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<HeldBadge>>>> {
    let user = resolve_user(&state, &username).await?;
    let held = state.awards.list_user_badges(user.id).await?;
    Ok(Json(ApiResponse::success(held)))
}

/// 触发全量自动评估
///
/// POST /api/badges/evaluate
///
/// 评估他人需要 `grant_badges` 权限
pub async fn evaluate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<ApiResponse<EvaluateResponse>>> {
    req.validate()?;

    let target = match req.username.as_deref() {
        Some(username) if !username.trim().eq_ignore_ascii_case(&current.username) => {
            require_permission(&state, &current, Permission::GrantBadges)?;
            resolve_user(&state, username).await?
        }
        _ => resolve_user(&state, &current.username).await?,
    };

    let results = state.awards.evaluate_automatic_badges(target.id).await?;
    let awarded = results.iter().filter(|r| r.awarded).count();
    info!(
        requested_by = %current.username,
        username = %target.username,
        awarded,
        "自动评估完成"
    );

    Ok(Json(ApiResponse::success(EvaluateResponse {
        username: target.username,
        awarded,
        results,
    })))
}

/// 未持有徽章的进度
///
/// GET /api/badges/progress?username=
pub async fn progress(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ApiResponse<ProgressResponse>>> {
    let username = query.username.as_deref().unwrap_or(&current.username);
    let user = resolve_user(&state, username).await?;

    let progress = state.awards.get_badge_progress(user.id).await?;
    let counters = state.awards.user_counters(user.id).await?;
    let next_badges = progress.iter().take(NEXT_BADGES_LIMIT).cloned().collect();

    Ok(Json(ApiResponse::success(ProgressResponse {
        username: user.username,
        progress,
        counters,
        next_badges,
    })))
}

/// 手动发放
///
/// POST /api/badges/award
pub async fn award(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<AwardBadgeRequest>,
) -> Result<Json<ApiResponse<AwardResult>>> {
    req.validate()?;
    require_permission(&state, &current, Permission::GrantBadges)?;

    let user = resolve_user(&state, &req.to_username).await?;
    let result = state
        .awards
        .award_badge(
            user.id,
            req.badge_slug.trim(),
            &current.username,
            req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()),
        )
        .await?;

    award_response(result)
}

/// 撤销
///
/// DELETE /api/badges/award
pub async fn revoke(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<RevokeBadgeRequest>,
) -> Result<Json<ApiResponse<RevokeResult>>> {
    req.validate()?;
    require_permission(&state, &current, Permission::RevokeBadges)?;

    let user = resolve_user(&state, &req.username).await?;
    let result = state.awards.revoke_badge(user.id, req.badge_slug.trim()).await?;
    if let Some(rejection) = result.rejection {
        return Err(ApiError::Rejected(rejection));
    }

    info!(
        revoked_by = %current.username,
        username = %user.username,
        badge_slug = %req.badge_slug,
        "徽章已撤销"
    );
    let message = result.message.clone();
    Ok(Json(ApiResponse::success_with_message(
        RevokeResult::revoked(result.message),
        message,
    )))
}

/// 发放赞助徽章
///
/// POST /api/badges/patron
pub async fn patron(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<PatronAwardRequest>,
) -> Result<Json<ApiResponse<AwardResult>>> {
    req.validate()?;
    require_permission(&state, &current, Permission::GrantBadges)?;

    let user = resolve_user(&state, &req.username).await?;
    let result = state
        .awards
        .award_patron_badge(
            user.id,
            req.tier,
            req.payment_reference.as_deref(),
            req.impact_choice.as_deref(),
        )
        .await?;

    award_response(result)
}
