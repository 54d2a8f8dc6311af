//! 管理员权限
//!
//! 管理员名单来自 JSON 文件，加载到可注入的 `AdminRegistry` 中。
//! 名单只在显式 `reload()` 时刷新；`AdminRegistryWatcher` 可在文件变更时自动调用。

mod registry;
mod watcher;

pub use registry::{AdminEntry, AdminRegistry, AdminSettings, Permission};
pub use watcher::AdminRegistryWatcher;
