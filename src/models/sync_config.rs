use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// 默认的解答存放目录
pub const DEFAULT_BASE_PATH: &str = "solutions";

/// 同步配置（持久化在 `csesConfig` 键下）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// owner/name
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// 只有用户选择保存时才会写入
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub exchange_url: String,
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            base_path: default_base_path(),
            token: None,
            client_id: String::new(),
            exchange_url: String::new(),
        }
    }
}

impl SyncConfig {
    /// 为空时回退到 `solutions`
    pub fn effective_base_path(&self) -> &str {
        if self.base_path.trim().is_empty() {
            DEFAULT_BASE_PATH
        } else {
            self.base_path.trim()
        }
    }

    /// 非空的 token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// 仓库标识（owner/name）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// 解析 `owner/name`，两段都不能为空
    pub fn parse(repo: &str) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::MalformedRepo {
            repo: repo.to_string(),
        };
        let (owner, name) = repo.trim().split_once('/').ok_or_else(malformed)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(malformed());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
