//! 徽章认可 HTTP 服务
//!
//! 在认可引擎之上提供 REST API：徽章目录与持有查询、自动评估、手动发放/撤销、
//! 赞助徽章、同伴徽章与感谢。
//!
//! ## 身份
//!
//! 上游代理通过 `x-auth-user` 头传入用户名，缺失或未知用户返回 401。
//! 管理类操作依据管理员名单中的权限判定。
//!
//! ## 模块结构
//!
//! - `dto`: 请求/响应数据传输对象
//! - `error`: API 错误与状态码映射
//! - `handlers`: 请求处理器
//! - `middleware`: 身份解析中间件
//! - `routes`: 路由配置
//! - `state`: 应用共享状态

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use state::AppState;
