//! 感谢 API 处理器

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;
use validator::Validate;

use recognition_engine::dto::{KudoFeed, KudoOutcome, UserKudos};
use recognition_engine::{FEED_LIMIT_DEFAULT, KudoDirection, KudoRequest};

use crate::dto::{ApiResponse, KudoCreateRequest, KudoFeedQuery, UserKudosQuery};
use crate::error::{ApiError, Result};
use crate::handlers::resolve_user;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// 发送感谢
///
/// POST /api/kudos
pub async fn create_kudo(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<KudoCreateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<KudoOutcome>>)> {
    req.validate()?;

    let recipient = resolve_user(&state, &req.to_username).await?;
    if recipient.id == current.id {
        return Err(ApiError::Validation("You cannot send kudos to yourself".to_string()));
    }

    let outcome = state
        .kudos
        .record_kudo(KudoRequest {
            from_user_id: current.id,
            to_user_id: recipient.id,
            message: req.message,
            category: req.category.filter(|c| !c.trim().is_empty()),
            is_public: req.is_public.unwrap_or(true),
        })
        .await?
        .map_err(ApiError::Rejected)?;

    info!(
        kudo_id = outcome.kudo.id,
        from = %current.username,
        to = %recipient.username,
        new_badges = outcome.new_badges.len(),
        "感谢已发送"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

/// 公开感谢动态
///
/// GET /api/kudos?limit=&cursor=
pub async fn list_kudos(
    State(state): State<AppState>,
    Query(query): Query<KudoFeedQuery>,
) -> Result<Json<ApiResponse<KudoFeed>>> {
    let feed = state
        .kudos
        .kudos_feed(query.limit.unwrap_or(FEED_LIMIT_DEFAULT), query.cursor)
        .await?;
    Ok(Json(ApiResponse::success(feed)))
}

/// 用户收到/发出的感谢
///
/// GET /api/kudos/user/{username}?type=received|sent|all
///
/// 私密感谢只对本人可见
pub async fn list_user_kudos(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(username): Path<String>,
    Query(query): Query<UserKudosQuery>,
) -> Result<Json<ApiResponse<UserKudos>>> {
    let direction = match query.direction.as_deref() {
        None => KudoDirection::default(),
        Some(raw) => KudoDirection::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("未知的感谢列表类型: {raw}")))?,
    };

    let user = resolve_user(&state, &username).await?;
    let include_private = user.id == current.id;
    let kudos = state.kudos.user_kudos(user, direction, include_private).await?;
    Ok(Json(ApiResponse::success(kudos)))
}

