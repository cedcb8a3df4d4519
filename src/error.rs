use thiserror::Error;

/// 应用程序错误类型
///
/// 每个 action 处理器在最外层捕获它，并以 `{ok: false, error: <Display>}` 回复调用方
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（缺少 repo / path / token，或 repo 格式不对）
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// 远端仓库内容 API 返回非成功状态
    #[error("{0}")]
    RemoteApi(#[from] RemoteApiError),
    /// 拉取 paste 失败
    #[error("{0}")]
    Fetch(#[from] FetchError),
    /// OAuth 授权流程失败
    #[error("{0}")]
    OAuth(#[from] OAuthError),
    /// 本地存储读写失败
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// 网络请求失败（连接、TLS 等传输层错误）
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// JSON 解析失败
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// 缺少 action 或 action 不认识（字段只用于日志）
    #[error("unknown action")]
    UnknownAction(String),
    /// 消息不是 JSON 对象
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    /// 浏览器相关错误
    #[error("browser error: {0}")]
    Browser(String),
    /// 其他错误
    #[error("{0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 上传单题时缺少必要配置
    #[error("missing repo/basePath/token")]
    MissingUploadSettings,
    /// 同步快照时缺少必要配置
    #[error("missing repo/path/token")]
    MissingSyncSettings,
    /// 没有可用的 token
    #[error("No token configured")]
    NoToken,
    /// repo 不是 owner/repo 格式
    #[error("repo must be owner/repo")]
    MalformedRepo { repo: String },
    /// 环境变量解析失败
    #[error("cannot parse env var {var_name}: '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 远端仓库内容 API 错误
///
/// 状态码与响应体原样带出
#[derive(Debug, Error, PartialEq, Eq)]
#[error("GitHub error: {status} {body}")]
pub struct RemoteApiError {
    pub status: u16,
    pub body: String,
}

/// 拉取 paste 错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// 普通拉取返回非成功状态
    #[error("Fetch failed: {status} (URL: {url})")]
    BadStatus { status: u16, url: String },
    /// CSES paste 页面返回非成功状态
    #[error("CSES paste fetch failed: HTTP {status}")]
    CsesStatus { status: u16 },
    /// CSES paste 页面里找不到 <pre> 代码块
    #[error("CSES paste fetch failed: Could not find code in paste page")]
    CsesNoCode,
    /// 拉到的 paste 是空的
    #[error("paste is empty: {url}")]
    EmptyPaste { url: String },
    /// 既没有代码也没有 URL
    #[error("Paste code or URL")]
    NothingToSubmit,
}

/// OAuth 授权流程错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OAuthError {
    #[error("missing clientId")]
    MissingClientId,
    #[error("no exchangeUrl provided; set up a proxy to exchange code for token")]
    MissingExchangeUrl,
    /// 用户关闭了授权窗口或宿主报告取消
    #[error("no redirect returned: {0}")]
    Cancelled(String),
    #[error("no redirect returned: timed out after {0}s")]
    TimedOut(u64),
    #[error("invalid redirect: {0}")]
    InvalidRedirect(String),
    /// 用户拒绝授权，回调里带着 error 参数
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("no code in redirect")]
    NoCode,
    #[error("exchange failed: {status} {body}")]
    ExchangeRejected { status: u16, body: String },
    #[error("no access_token in exchange response")]
    NoToken,
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a JSON object: {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建远端 API 错误
    pub fn remote_api(status: u16, body: impl Into<String>) -> Self {
        AppError::RemoteApi(RemoteApiError {
            status,
            body: body.into(),
        })
    }

    /// 创建浏览器错误
    pub fn browser(message: impl std::fmt::Display) -> Self {
        AppError::Browser(message.to_string())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_api_error_embeds_status_and_body() {
        let err = AppError::remote_api(422, r#"{"message":"Invalid request"}"#);
        let msg = err.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains(r#"{"message":"Invalid request"}"#));
    }

    #[test]
    fn test_nested_errors_display_without_prefix() {
        let err: AppError = ConfigError::MalformedRepo {
            repo: "nobody".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "repo must be owner/repo");
    }
}
