//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    server_handle: tokio::task::JoinHandle<()>,
}

impl MetricsHandle {
    /// 停止指标 HTTP 服务器
    pub fn shutdown(self) {
        self.server_handle.abort();
    }
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle { server_handle })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("badge_awards_total", "Total number of badge award attempts");
    metrics::describe_counter!("badge_revocations_total", "Total number of badge revocations");

    metrics::describe_counter!(
        "badge_evaluations_total",
        "Total number of trigger evaluations"
    );
    metrics::describe_histogram!(
        "badge_evaluation_duration_seconds",
        "Trigger evaluation duration in seconds"
    );

    metrics::describe_counter!("peer_awards_total", "Total number of peer award attempts");
    metrics::describe_counter!("notifications_total", "Total number of notifications dispatched");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录徽章发放
///
/// `source` 为 automatic / manual / peer / patron，`outcome` 为 awarded 或拒绝原因码
#[inline]
pub fn record_badge_award(source: &str, outcome: &str) {
    metrics::counter!(
        "badge_awards_total",
        "source" => source.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录徽章撤销
#[inline]
pub fn record_badge_revocation(outcome: &str) {
    metrics::counter!(
        "badge_revocations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录一次触发器评估
///
/// `scope` 为 all（全量扫描）或具体的触发类型
#[inline]
pub fn record_evaluation(scope: &str, awarded: usize, duration_secs: f64) {
    metrics::counter!(
        "badge_evaluations_total",
        "scope" => scope.to_string(),
        "awarded" => (awarded > 0).to_string()
    )
    .increment(1);

    metrics::histogram!(
        "badge_evaluation_duration_seconds",
        "scope" => scope.to_string()
    )
    .record(duration_secs);
}

/// 记录同伴徽章发放
#[inline]
pub fn record_peer_award(outcome: &str) {
    metrics::counter!(
        "peer_awards_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录通知投递
#[inline]
pub fn record_notification(channel: &str, outcome: &str) {
    metrics::counter!(
        "notifications_total",
        "channel" => channel.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
