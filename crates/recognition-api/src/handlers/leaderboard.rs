//! 排行榜 API 处理器

use axum::{
    Json,
    extract::{Query, State},
};

use recognition_engine::dto::Leaderboard;
use recognition_engine::{LEADERBOARD_LIMIT_DEFAULT, LeaderboardKind};

use crate::dto::{ApiResponse, LeaderboardQuery};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 用户排行榜
///
/// GET /api/leaderboard?type=badges|kudos_received|kudos_sent&limit=
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Leaderboard>>> {
    let kind = match query.kind.as_deref() {
        None => LeaderboardKind::default(),
        Some(raw) => LeaderboardKind::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("未知的排行榜类型: {raw}")))?,
    };

    let board = state
        .awards
        .leaderboard(kind, query.limit.unwrap_or(LEADERBOARD_LIMIT_DEFAULT))
        .await?;
    Ok(Json(ApiResponse::success(board)))
}
