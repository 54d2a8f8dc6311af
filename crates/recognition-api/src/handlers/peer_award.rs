//! 同伴徽章 API 处理器

use axum::{Extension, Json, extract::State};
use validator::Validate;

use recognition_engine::dto::PeerAwardStatus;

use crate::dto::{ApiResponse, PeerAwardRequest, PeerAwardResponse};
use crate::error::{ApiError, Result};
use crate::handlers::resolve_user;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 发放同伴徽章
///
/// POST /api/badges/peer-award
///
/// 不能发给自己；成功后返回本年剩余数量
pub async fn award_peer(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<PeerAwardRequest>,
) -> Result<Json<ApiResponse<PeerAwardResponse>>> {
    req.validate()?;

    let recipient = resolve_user(&state, &req.to_username).await?;
    if recipient.id == current.id {
        return Err(ApiError::Validation(
            "You cannot give a Resonance badge to yourself".to_string(),
        ));
    }

    let result = state
        .peer_awards
        .award_peer_badge(current.id, recipient.id, &req.message)
        .await?;
    if let Some(rejection) = result.rejection.clone() {
        return Err(ApiError::Rejected(rejection));
    }

    let remaining = state.peer_awards.get_remaining_peer_awards(current.id).await?;
    let message = result.reason.clone().unwrap_or_default();
    Ok(Json(ApiResponse::success_with_message(
        PeerAwardResponse { result, remaining },
        message,
    )))
}

/// 本年同伴徽章限额状态
///
/// GET /api/badges/peer-award
pub async fn status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<PeerAwardStatus>>> {
    let status = state.peer_awards.peer_award_status(current.id).await?;
    Ok(Json(ApiResponse::success(status)))
}
