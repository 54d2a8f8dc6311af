//! 中间件模块

pub mod auth;

pub use auth::{AUTH_USER_HEADER, CurrentUser, auth_middleware};
