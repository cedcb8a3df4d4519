//! OAuth 授权服务 - 业务能力层
//!
//! 线性流程，不重试：
//!
//! ```text
//! Idle → AuthorizationRequested → RedirectReceived → CodeExtracted → TokenExchanged → Stored
//! ```
//!
//! 任何一步失败都直接结束。本程序不持有 client secret，code 交给调用方部署的代理去换 token

use crate::error::{AppError, AppResult, OAuthError};
use crate::infrastructure::{AuthLauncher, AuthRedirect, HttpRequest, HttpTransport, KeyValueStore};
use crate::services::record_store::ConfigStore;
use crate::utils::truncate_text;
use reqwest::Url;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 申请的权限
pub const OAUTH_SCOPE: &str = "repo";

/// 换 token 响应里可能的字段名，按顺序尝试
const TOKEN_FIELDS: [&str; 3] = ["access_token", "token", "accessToken"];

/// 流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthStage {
    Idle,
    AuthorizationRequested,
    RedirectReceived,
    CodeExtracted,
    TokenExchanged,
    Stored,
}

impl fmt::Display for OAuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OAuthStage::Idle => "空闲",
            OAuthStage::AuthorizationRequested => "等待授权",
            OAuthStage::RedirectReceived => "收到回调",
            OAuthStage::CodeExtracted => "取得 code",
            OAuthStage::TokenExchanged => "取得 token",
            OAuthStage::Stored => "已保存",
        };
        f.write_str(name)
    }
}

/// 构建授权页地址
pub fn authorization_url(authorize_url: &str, client_id: &str, redirect_uri: &str) -> AppResult<String> {
    let url = Url::parse_with_params(
        authorize_url,
        &[
            ("client_id", client_id),
            ("scope", OAUTH_SCOPE),
            ("redirect_uri", redirect_uri),
        ],
    )
    .map_err(|e| AppError::Other(format!("invalid authorize URL {}: {}", authorize_url, e)))?;
    Ok(url.to_string())
}

/// 从回调地址的 query 中取 code
pub fn extract_code(redirect: &str) -> Result<String, OAuthError> {
    let url = Url::parse(redirect).map_err(|_| OAuthError::InvalidRedirect(redirect.to_string()))?;

    let mut code = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, error) {
        (Some(code), _) => Ok(code),
        (None, Some(error)) => Err(OAuthError::Denied(error)),
        (None, None) => Err(OAuthError::NoCode),
    }
}

/// 从换 token 的响应里挑出 token
pub fn pick_token(response: &Value) -> Option<String> {
    TOKEN_FIELDS
        .iter()
        .filter_map(|field| response.get(*field).and_then(Value::as_str))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// OAuth 授权服务
pub struct OAuthService<T, S, L> {
    transport: T,
    configs: ConfigStore<S>,
    launcher: L,
    authorize_url: String,
    timeout: Duration,
}

impl<T, S, L> OAuthService<T, S, L>
where
    T: HttpTransport,
    S: KeyValueStore,
    L: AuthLauncher,
{
    pub fn new(
        transport: T,
        configs: ConfigStore<S>,
        launcher: L,
        authorize_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            configs,
            launcher,
            authorize_url: authorize_url.into(),
            timeout,
        }
    }

    /// 走完整个授权流程，token 合并写入同步配置
    ///
    /// # 参数
    /// - `client_id`: OAuth App 的 client id
    /// - `exchange_url`: 用 code 换 token 的代理地址
    pub async fn authorize(&self, client_id: &str, exchange_url: &str) -> AppResult<()> {
        let mut stage = OAuthStage::Idle;
        let result = self.run(client_id, exchange_url, &mut stage).await;
        match &result {
            Ok(()) => info!("✅ 授权完成，token 已保存"),
            Err(e) => warn!("❌ 授权在「{}」阶段失败: {}", stage, e),
        }
        result
    }

    async fn run(&self, client_id: &str, exchange_url: &str, stage: &mut OAuthStage) -> AppResult<()> {
        let client_id = client_id.trim();
        let exchange_url = exchange_url.trim();
        if client_id.is_empty() {
            return Err(OAuthError::MissingClientId.into());
        }
        if exchange_url.is_empty() {
            return Err(OAuthError::MissingExchangeUrl.into());
        }

        let redirect_uri = self.launcher.redirect_uri();
        let auth_url = authorization_url(&self.authorize_url, client_id, &redirect_uri)?;
        advance(stage, OAuthStage::AuthorizationRequested);
        info!("🔐 打开授权页，等待用户确认...");

        let redirect = tokio::time::timeout(self.timeout, self.launcher.launch(&auth_url))
            .await
            .map_err(|_| OAuthError::TimedOut(self.timeout.as_secs()))??;
        let redirect = match redirect {
            AuthRedirect::Completed(url) => url,
            AuthRedirect::Cancelled(reason) => return Err(OAuthError::Cancelled(reason).into()),
        };
        advance(stage, OAuthStage::RedirectReceived);

        let code = extract_code(&redirect)?;
        advance(stage, OAuthStage::CodeExtracted);

        let token = self
            .exchange_code(exchange_url, &code, &redirect_uri, client_id)
            .await?;
        advance(stage, OAuthStage::TokenExchanged);

        self.configs.merge_token(&token).await?;
        advance(stage, OAuthStage::Stored);
        Ok(())
    }

    /// 用 code 换 token
    async fn exchange_code(
        &self,
        exchange_url: &str,
        code: &str,
        redirect_uri: &str,
        client_id: &str,
    ) -> AppResult<String> {
        let request = HttpRequest::post(exchange_url)
            .header("Accept", "application/json")
            .json(&json!({
                "code": code,
                "redirect_uri": redirect_uri,
                "client_id": client_id,
            }))?;

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(OAuthError::ExchangeRejected {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        let data: Value = response.json().map_err(|e| {
            debug!("换 token 响应不是 JSON: {}", truncate_text(&response.body, 200));
            e
        })?;
        pick_token(&data).ok_or_else(|| OAuthError::NoToken.into())
    }
}

fn advance(stage: &mut OAuthStage, next: OAuthStage) {
    debug!("OAuth: {} → {}", stage, next);
    *stage = next;
}
