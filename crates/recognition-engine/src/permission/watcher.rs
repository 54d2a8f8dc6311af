//! 管理员名单文件监听
//!
//! 使用 `notify` 监听名单文件所在目录，事件经 debounce 窗口去抖后调用
//! `AdminRegistry::reload()`。监听目录而非文件本身，以覆盖 ConfigMap 式的原子替换。

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use super::registry::AdminRegistry;

/// 管理员名单文件监听器
pub struct AdminRegistryWatcher {
    registry: Arc<AdminRegistry>,
    debounce: Duration,
    /// 持有 watcher 保证监听在 stop 前持续有效
    watcher: Mutex<Option<RecommendedWatcher>>,
    shutdown_tx: watch::Sender<bool>,
}

impl AdminRegistryWatcher {
    pub fn new(registry: Arc<AdminRegistry>, debounce: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            registry,
            debounce,
            watcher: Mutex::new(None),
            shutdown_tx,
        }
    }

    /// 启动监听
    pub fn start(&self) -> Result<()> {
        let path = self
            .registry
            .path()
            .ok_or_else(|| anyhow!("管理员名单未关联文件，无法监听"))?
            .to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        let file_name: Option<OsString> = path.file_name().map(|n| n.to_os_string());

        let (event_tx, mut event_rx) = mpsc::channel::<()>(16);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let relevant = matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) && event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant {
                        let _ = event_tx.try_send(());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "管理员名单监听事件错误");
                }
            },
        )
        .context("创建文件监听器失败")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("监听目录失败: {}", dir.display()))?;
        *self.watcher.lock() = Some(watcher);

        info!(path = %path.display(), "管理员名单文件监听已启动");

        let registry = self.registry.clone();
        let debounce = self.debounce;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(()) = event_rx.recv() => {
                        tokio::time::sleep(debounce).await;
                        while event_rx.try_recv().is_ok() {}

                        // 失败时 reload 内部已记录日志并保留旧名单
                        let _ = registry.reload();
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("管理员名单文件监听已停止");
                            break;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    /// 停止监听
    pub fn stop(&self) {
        self.watcher.lock().take();
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for AdminRegistryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_without_file_fails() {
        let watcher =
            AdminRegistryWatcher::new(Arc::new(AdminRegistry::empty()), Duration::from_millis(10));
        assert!(watcher.start().is_err());
    }

    #[tokio::test]
    async fn test_file_change_triggers_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admins.json");
        std::fs::write(&path, r#"{"admins": []}"#).unwrap();

        let registry = Arc::new(AdminRegistry::load(&path).unwrap());
        let watcher = AdminRegistryWatcher::new(registry.clone(), Duration::from_millis(20));
        watcher.start().unwrap();

        std::fs::write(
            &path,
            r#"{"admins": [{"username": "lead", "permissions": ["manage_admins"]}]}"#,
        )
        .unwrap();

        let mut reloaded = false;
        for _ in 0..100 {
            if registry.is_admin("lead") {
                reloaded = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        watcher.stop();
        assert!(reloaded);
    }
}
