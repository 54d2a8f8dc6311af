//! 引擎错误类型
//!
//! 区分两类失败：
//! - `Rejection`：可预期的业务拒绝（徽章不存在、已持有、限额用尽等），作为结果值返回
//! - `EngineError`：存储 I/O 等硬错误，通过 `Err` 传播并中止当前批次

use serde::Serialize;
use thiserror::Error;

/// 引擎硬错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::StoreUnavailable(_))
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// 业务拒绝
///
/// 调用方可据此区分"不存在"与其他拒绝，HTTP 层据此映射状态码。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    #[error("Badge not found: {slug}")]
    BadgeNotFound { slug: String },

    #[error("User not found: {user_id}")]
    #[serde(rename_all = "camelCase")]
    UserNotFound { user_id: i64 },

    #[error("User already has the badge {slug}")]
    AlreadyAwarded { slug: String },

    #[error("User does not have the badge {slug}")]
    NotHeld { slug: String },

    #[error("You have used all {max_per_year} Resonance badges for {year}")]
    #[serde(rename_all = "camelCase")]
    QuotaExceeded {
        year: i32,
        max_per_year: u32,
        remaining: u32,
    },

    #[error("{message}")]
    Validation { message: String },
}

impl Rejection {
    /// 获取拒绝码（用于 API 响应）
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadgeNotFound { .. } => "BADGE_NOT_FOUND",
            Self::UserNotFound { .. } => "USER_NOT_FOUND",
            Self::AlreadyAwarded { .. } => "ALREADY_AWARDED",
            Self::NotHeld { .. } => "NOT_HELD",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::Validation { .. } => "VALIDATION_ERROR",
        }
    }

    /// 是否为"不存在"类拒绝
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BadgeNotFound { .. } | Self::UserNotFound { .. })
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(EngineError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(EngineError::StoreUnavailable("down".to_string()).is_retryable());
        assert!(!EngineError::Internal("boom".to_string()).is_retryable());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            EngineError::StoreUnavailable("down".to_string()).error_code(),
            "STORE_UNAVAILABLE"
        );
        assert_eq!(
            EngineError::Config("bad".to_string()).error_code(),
            "CONFIG_ERROR"
        );
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(
            Rejection::BadgeNotFound {
                slug: "mvp".to_string()
            }
            .code(),
            "BADGE_NOT_FOUND"
        );
        assert!(Rejection::UserNotFound { user_id: 7 }.is_not_found());
        assert!(
            !Rejection::NotHeld {
                slug: "mvp".to_string()
            }
            .is_not_found()
        );
    }

    #[test]
    fn test_rejection_display() {
        let quota = Rejection::QuotaExceeded {
            year: 2025,
            max_per_year: 2,
            remaining: 0,
        };
        assert_eq!(quota.to_string(), "You have used all 2 Resonance badges for 2025");
        assert_eq!(Rejection::validation("too short").to_string(), "too short");
    }

    #[test]
    fn test_rejection_serialization() {
        let json = serde_json::to_value(Rejection::QuotaExceeded {
            year: 2025,
            max_per_year: 2,
            remaining: 0,
        })
        .unwrap();
        assert_eq!(json["code"], "QUOTA_EXCEEDED");
        assert_eq!(json["maxPerYear"], 2);
        assert_eq!(json["remaining"], 0);
    }
}
