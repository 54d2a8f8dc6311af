//! 管理员注册表

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, Result};

/// 管理员权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    GrantBadges,
    RevokeBadges,
    ManageUsers,
    ManageAdmins,
    /// 文件中出现的未知权限，不授予任何能力
    #[serde(other)]
    Unknown,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrantBadges => "grant_badges",
            Self::RevokeBadges => "revoke_badges",
            Self::ManageUsers => "manage_users",
            Self::ManageAdmins => "manage_admins",
            Self::Unknown => "unknown",
        }
    }
}

/// 管理员条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEntry {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub added_by: Option<String>,
}

impl AdminEntry {
    pub fn has(&self, permission: Permission) -> bool {
        permission != Permission::Unknown && self.permissions.contains(&permission)
    }
}

/// 名单全局设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminSettings {
    pub require_approval: bool,
    pub allow_self_assignment: bool,
    pub audit_log: bool,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            require_approval: true,
            allow_self_assignment: false,
            audit_log: true,
        }
    }
}

/// admins.json 文件结构
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct AdminsFile {
    admins: Vec<AdminEntry>,
    settings: AdminSettings,
}

/// 管理员注册表
///
/// 读取走 `ArcSwap` 快照，`reload()` 原子替换；重载失败时保留旧名单。
pub struct AdminRegistry {
    path: Option<PathBuf>,
    current: ArcSwap<AdminsFile>,
}

impl AdminRegistry {
    /// 从文件加载；文件不存在时得到空名单与默认设置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = read_admins_file(&path)?;
        info!(path = %path.display(), admins = file.admins.len(), "管理员名单已加载");
        Ok(Self {
            path: Some(path),
            current: ArcSwap::from_pointee(file),
        })
    }

    /// 不关联文件的名单
    pub fn from_entries(admins: Vec<AdminEntry>, settings: AdminSettings) -> Self {
        Self {
            path: None,
            current: ArcSwap::from_pointee(AdminsFile { admins, settings }),
        }
    }

    /// 空名单
    pub fn empty() -> Self {
        Self::from_entries(Vec::new(), AdminSettings::default())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 重新读取文件并原子替换，返回管理员数量
    pub fn reload(&self) -> Result<usize> {
        let Some(path) = &self.path else {
            return Ok(self.current.load().admins.len());
        };

        match read_admins_file(path) {
            Ok(file) => {
                let count = file.admins.len();
                self.current.store(Arc::new(file));
                info!(path = %path.display(), admins = count, "管理员名单已重新加载");
                Ok(count)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "管理员名单重新加载失败，保留当前名单");
                Err(e)
            }
        }
    }

    /// 用户名大小写不敏感查找
    pub fn admin(&self, username: &str) -> Option<AdminEntry> {
        self.current
            .load()
            .admins
            .iter()
            .find(|a| a.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admin(username).is_some()
    }

    pub fn has_permission(&self, username: &str, permission: Permission) -> bool {
        self.admin(username).is_some_and(|a| a.has(permission))
    }

    pub fn admins(&self) -> Vec<AdminEntry> {
        self.current.load().admins.clone()
    }

    pub fn settings(&self) -> AdminSettings {
        self.current.load().settings.clone()
    }
}

fn read_admins_file(path: &Path) -> Result<AdminsFile> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "管理员名单文件不存在，使用空名单");
            return Ok(AdminsFile::default());
        }
        Err(e) => {
            return Err(EngineError::Config(format!(
                "读取管理员名单失败 {}: {}",
                path.display(),
                e
            )));
        }
    };

    serde_json::from_str(&content).map_err(|e| {
        EngineError::Config(format!("解析管理员名单失败 {}: {}", path.display(), e))
    })
}
