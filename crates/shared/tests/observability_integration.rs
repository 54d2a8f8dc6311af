//! 可观测性模块集成测试
//!
//! 测试 metrics 辅助函数、配置与 guard 的核心行为。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use recognition_shared::observability::metrics::{
        record_badge_award, record_badge_revocation, record_evaluation, record_http_request,
        record_notification, record_peer_award,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/badges", 200, 0.05);
        record_http_request("POST", "/api/badges/award", 200, 0.12);
        record_http_request("DELETE", "/api/badges/award", 404, 0.03);
        record_http_request("POST", "/api/badges/peer-award", 400, 0.01);
        record_http_request("POST", "/api/kudos", 500, 0.25);
    }

    #[test]
    fn test_record_award_outcomes() {
        record_badge_award("automatic", "awarded");
        record_badge_award("automatic", "already_awarded");
        record_badge_award("manual", "rejected");
        record_badge_award("patron", "awarded");
        record_badge_revocation("revoked");
        record_badge_revocation("rejected");
    }

    #[test]
    fn test_record_evaluation_and_peer() {
        record_evaluation("full", 2, 0.01);
        record_evaluation("single", 0, 0.002);
        record_peer_award("granted");
        record_peer_award("QUOTA_EXCEEDED");
        record_notification("log", "delivered");
        record_notification("postgres", "failed");
    }

    #[test]
    fn test_metrics_with_edge_cases() {
        // 空字符串
        record_http_request("", "", 0, 0.0);

        // 超长路径
        let long_path = "/api/".to_string() + &"x".repeat(1000);
        record_http_request("GET", &long_path, 200, 0.01);

        // 极端持续时间
        record_evaluation("full", usize::MAX, 999.99);
    }
}

// ============================================================================
// 中间件类型测试
// ============================================================================

mod middleware_tests {
    use recognition_shared::observability::middleware::{REQUEST_ID_HEADER, RequestId};

    #[test]
    fn test_request_id_creation() {
        let id = RequestId("test-id-123".to_string());
        assert_eq!(id.as_str(), "test-id-123");
    }

    #[test]
    fn test_request_id_clone() {
        let id1 = RequestId("original".to_string());
        let id2 = id1.clone();
        assert_eq!(id1.as_str(), id2.as_str());
    }

    #[test]
    fn test_header_name() {
        assert_eq!(REQUEST_ID_HEADER, "x-request-id");
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use recognition_shared::observability::ObservabilityConfig;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "unknown-service");
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.log_level, "info");
        assert!(config.metrics_enabled);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_custom_config() {
        let config = ObservabilityConfig {
            service_name: "my-service".to_string(),
            metrics_enabled: false,
            metrics_port: 9091,
            log_level: "debug".to_string(),
            json_logs: true,
        };

        assert_eq!(config.service_name, "my-service");
        assert_eq!(config.metrics_port, 9091);
        assert!(!config.metrics_enabled);
        assert!(config.json_logs);
    }
}

// ============================================================================
// Guard 测试
// ============================================================================

mod guard_tests {
    use recognition_shared::observability::ObservabilityGuard;

    #[test]
    fn test_empty_guard() {
        // 创建空 guard 不应 panic
        let guard = ObservabilityGuard::empty();
        // drop 时也不应 panic
        drop(guard);
    }
}
