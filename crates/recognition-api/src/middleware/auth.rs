//! 身份解析中间件
//!
//! 上游代理完成认证后通过 `x-auth-user` 头传入用户名，
//! 中间件将其解析为已注册用户并注入请求扩展。

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;

/// 用户名请求头
pub const AUTH_USER_HEADER: &str = "x-auth-user";

/// 当前请求的用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// 认证中间件
///
/// 缺少请求头或用户不存在时返回 401。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let username = request
        .headers()
        .get(AUTH_USER_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let Some(username) = username else {
        return ApiError::Unauthorized("缺少用户身份".to_string()).into_response();
    };

    match state.users().find_by_username(&username).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(CurrentUser {
                id: user.id,
                username: user.username,
            });
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!(username = %username, "未知用户");
            ApiError::Unauthorized(format!("未知用户: {username}")).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
