//! 徽章认可 HTTP 服务
//!
//! 提供徽章目录、评估、发放、同伴徽章与感谢的 REST API。

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use recognition_api::{AppState, routes};
use recognition_engine::catalog::seed_catalog;
use recognition_engine::notification::{LogChannel, NotificationChannel, PgNotificationChannel};
use recognition_engine::{
    AdminRegistry, AdminRegistryWatcher, AwardService, InMemoryStore, NotificationSender,
    PeerAwardPolicy, Repositories, SystemClock,
};
use recognition_shared::{
    config::{AppConfig, StorageBackend},
    database::Database,
    observability,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 单个请求的处理超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("recognition-api").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting recognition-api on {}", config.server_addr());
    info!(environment = %config.environment, "Configuration loaded");

    if config.is_production() {
        if config.storage.backend == StorageBackend::Memory {
            anyhow::bail!("生产环境不允许使用内存存储");
        }
        if config.server.cors_origins.trim() == "*" {
            warn!("生产环境 CORS 允许全部来源");
        }
    }

    // 管理员名单：文件不存在时为空名单
    let admins = Arc::new(AdminRegistry::load(&config.recognition.admins_file)?);

    let (repos, channel, db): (Repositories, Arc<dyn NotificationChannel>, Option<Database>) =
        match config.storage.backend {
            StorageBackend::Postgres => {
                let db = Database::connect(&config.database).await?;
                if config.storage.run_migrations {
                    db.run_migrations().await?;
                }
                let pool = db.pool().clone();
                let channel: Arc<dyn NotificationChannel> =
                    Arc::new(PgNotificationChannel::new(pool.clone()));
                (Repositories::postgres(pool), channel, Some(db))
            }
            StorageBackend::Memory => {
                warn!("使用内存存储，进程退出后数据丢失");
                let store = Arc::new(InMemoryStore::new());
                // 名单中的管理员注册为本地用户，便于本地调试
                let now = chrono::Utc::now();
                for admin in admins.admins() {
                    store.add_user(&admin.username, admin.display_name.as_deref(), now);
                }
                let channel: Arc<dyn NotificationChannel> = Arc::new(LogChannel);
                (Repositories::in_memory(store), channel, None)
            }
        };

    if config.storage.seed_catalog {
        let count = seed_catalog(repos.badges.as_ref()).await?;
        info!(count, "徽章目录初始化完成");
    }

    let awards = Arc::new(AwardService::new(
        repos,
        NotificationSender::new(channel),
        Arc::new(SystemClock),
    ));

    let policy = PeerAwardPolicy {
        annual_quota: config.recognition.peer_award_annual_quota,
        min_message_len: config.recognition.peer_award_min_message_len,
    };

    let watcher = if config.recognition.watch_admins {
        let watcher = AdminRegistryWatcher::new(
            admins.clone(),
            Duration::from_millis(config.recognition.admins_watch_debounce_ms),
        );
        match watcher.start() {
            Ok(()) => Some(watcher),
            Err(e) => {
                // 监听失败不阻止服务启动，仍可通过 reload 接口手动重载
                warn!(error = %e, "管理员名单文件监听启动失败");
                None
            }
        }
    } else {
        None
    };

    let state = AppState::new(awards, policy, admins);

    let app = routes::app(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.cors_origins));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(watcher) = watcher {
        watcher.stop();
    }
    if let Some(db) = db {
        db.close().await;
    }

    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置："*" 允许全部来源，否则按逗号分隔的来源列表
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
