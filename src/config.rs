use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// 默认配置文件名（存在时自动加载）
pub const DEFAULT_CONFIG_FILE: &str = "cses-sync.toml";

/// 程序配置文件
///
/// 加载顺序：默认值 → TOML 文件 → 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 本地数据文件（problems 与 csesConfig 都存在这里）
    pub data_file: String,
    /// GitHub API 地址
    pub github_api_base_url: String,
    /// OAuth 授权页地址
    pub oauth_authorize_url: String,
    /// OAuth 回调地址（本机回环地址，由程序自己监听）
    pub oauth_redirect_uri: String,
    /// 等待用户完成授权的最长时间（秒）
    pub auth_timeout_secs: u64,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: "cses-sync-data.json".to_string(),
            github_api_base_url: "https://api.github.com".to_string(),
            oauth_authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            oauth_redirect_uri: "http://127.0.0.1:8976/callback".to_string(),
            auth_timeout_secs: 300,
            browser_debug_port: 9222,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载完整配置
    ///
    /// `CSES_SYNC_CONFIG` 指定的文件必须存在；未指定时只在当前目录有
    /// `cses-sync.toml` 时才读取
    pub fn load() -> Result<Self> {
        let base = match std::env::var("CSES_SYNC_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        debug!("已加载配置文件: {}", path.display());
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        Self {
            data_file: std::env::var("CSES_SYNC_DATA_FILE").unwrap_or(self.data_file),
            github_api_base_url: std::env::var("GITHUB_API_BASE_URL")
                .unwrap_or(self.github_api_base_url),
            oauth_authorize_url: std::env::var("OAUTH_AUTHORIZE_URL")
                .unwrap_or(self.oauth_authorize_url),
            oauth_redirect_uri: std::env::var("OAUTH_REDIRECT_URI")
                .unwrap_or(self.oauth_redirect_uri),
            auth_timeout_secs: parse_env("AUTH_TIMEOUT_SECS", "u64", self.auth_timeout_secs),
            browser_debug_port: parse_env("BROWSER_DEBUG_PORT", "u16", self.browser_debug_port),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool", self.verbose_logging),
        }
    }
}

/// 解析环境变量，失败时记录警告并保留原值
fn parse_env<T: std::str::FromStr>(var_name: &str, expected_type: &str, fallback: T) -> T {
    match std::env::var(var_name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                let err = ConfigError::EnvVarParseFailed {
                    var_name: var_name.to_string(),
                    value,
                    expected_type: expected_type.to_string(),
                };
                warn!("{}，使用默认值", err);
                fallback
            }
        },
        Err(_) => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_toml_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_file = \"/tmp/progress.json\"").unwrap();
        writeln!(file, "auth_timeout_secs = 30").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();

        assert_eq!(config.data_file, "/tmp/progress.json");
        assert_eq!(config.auth_timeout_secs, 30);
        assert_eq!(config.github_api_base_url, "https://api.github.com");
        assert_eq!(config.oauth_redirect_uri, "http://127.0.0.1:8976/callback");
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auth_timeout_secs = \"soon\"").unwrap();

        assert!(Config::from_toml_file(file.path()).is_err());
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        std::env::set_var("CSES_SYNC_TEST_PORT", "not-a-port");
        assert_eq!(parse_env("CSES_SYNC_TEST_PORT", "u16", 9222u16), 9222);
        std::env::set_var("CSES_SYNC_TEST_PORT", "9333");
        assert_eq!(parse_env("CSES_SYNC_TEST_PORT", "u16", 9222u16), 9333);
        std::env::remove_var("CSES_SYNC_TEST_PORT");
    }
}
