//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router, middleware,
    routing::{get, post},
};

use recognition_shared::observability::middleware as obs_middleware;

use crate::{handlers, middleware::auth_middleware, state::AppState};

/// 构建徽章相关的路由
fn badge_routes() -> Router<AppState> {
    Router::new()
        .route("/badges", get(handlers::badge::list_badges))
        .route("/badges/user/{username}", get(handlers::badge::list_user_badges))
        .route("/badges/evaluate", post(handlers::badge::evaluate))
        .route("/badges/progress", get(handlers::badge::progress))
        .route(
            "/badges/award",
            post(handlers::badge::award).delete(handlers::badge::revoke),
        )
        .route("/badges/patron", post(handlers::badge::patron))
        .route(
            "/badges/peer-award",
            post(handlers::peer_award::award_peer).get(handlers::peer_award::status),
        )
}

/// 构建感谢相关的路由
fn kudos_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/kudos",
            get(handlers::kudos::list_kudos).post(handlers::kudos::create_kudo),
        )
        .route("/kudos/user/{username}", get(handlers::kudos::list_user_kudos))
}

/// 构建排行榜路由
fn leaderboard_routes() -> Router<AppState> {
    Router::new().route("/leaderboard", get(handlers::leaderboard::leaderboard))
}

/// 构建管理员名单路由
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/admins", get(handlers::admin::list_admins))
        .route("/admin/admins/reload", post(handlers::admin::reload_admins))
}

/// 构建需要身份的 API 路由
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(badge_routes())
        .merge(kudos_routes())
        .merge(leaderboard_routes())
        .merge(admin_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// 构建完整应用路由
///
/// 包含存活探针与可观测性中间件；CORS、超时等部署相关的层由调用方追加。
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(state.clone()))
        .route("/health", get(handlers::health_check))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
