/// 仓库内容 API 客户端
///
/// 封装对 `/repos/{owner}/{repo}/contents/{path}` 的读写：
/// 先读出当前版本标记（sha），再带着它写入。
///
/// 注意：读和写是两次独立的往返，中间若有别人改了同一路径，
/// 旧的 sha 会让写入覆盖掉对方的修改而不被发现。这是已接受的风险，不做重试
use crate::error::{AppError, AppResult};
use crate::infrastructure::{HttpRequest, HttpTransport};
use crate::models::RepoId;
use crate::utils::truncate_text;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const USER_AGENT: &str = "cses-sync";
const ACCEPT: &str = "application/vnd.github+json";

/// 远端文件引用
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteBlobRef {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// upsert 结果
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertResult {
    /// 写入前是否不存在（没有版本标记）
    pub created: bool,
    /// 从响应里解析出的文件引用
    pub blob: Option<RemoteBlobRef>,
    /// 响应原文
    pub raw: Value,
}

/// 仓库内容 API 客户端
pub struct RepoContentsClient<T> {
    transport: T,
    api_base_url: String,
}

impl<T: HttpTransport> RepoContentsClient<T> {
    /// 创建新的仓库客户端
    pub fn new(transport: T, api_base_url: impl Into<String>) -> Self {
        Self {
            transport,
            api_base_url: api_base_url.into(),
        }
    }

    /// 构建内容 API 地址，路径的每一段单独编码
    pub fn contents_url(&self, repo: &RepoId, path: &str) -> AppResult<String> {
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Other(format!("invalid API base URL {}: {}", self.api_base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Other(format!("invalid API base URL: {}", self.api_base_url)))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.name.as_str(), "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url.to_string())
    }

    /// 读取当前版本标记
    ///
    /// 文件不存在、读取失败都返回 None（按新建处理）
    pub async fn fetch_revision(&self, url: &str, token: &str) -> Option<String> {
        let request = self.authorized(HttpRequest::get(url), token);
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("读取现有文件失败，按新建处理: {}", e);
                return None;
            }
        };

        if !response.is_success() {
            debug!("现有文件不存在 ({}): {}", response.status, url);
            return None;
        }

        match response.json::<Value>() {
            Ok(json) => json.get("sha").and_then(Value::as_str).map(str::to_string),
            Err(e) => {
                warn!("现有文件元数据无法解析，按新建处理: {}", e);
                None
            }
        }
    }

    /// 写入（存在则更新，不存在则新建）
    ///
    /// # 参数
    /// - `repo`: 仓库
    /// - `path`: 仓库内路径
    /// - `content`: 文件内容（原始字节）
    /// - `message`: 提交信息
    /// - `token`: 访问令牌
    ///
    /// # 返回
    /// 非 2xx 响应返回 `RemoteApiError`，带状态码和响应原文
    pub async fn upsert(
        &self,
        repo: &RepoId,
        path: &str,
        content: &[u8],
        message: &str,
        token: &str,
    ) -> AppResult<UpsertResult> {
        let url = self.contents_url(repo, path)?;
        let sha = self.fetch_revision(&url, token).await;

        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content),
        });
        if let Some(sha) = &sha {
            body["sha"] = json!(sha);
        }

        debug!("写入 {} ({} 字节, sha: {:?})", url, content.len(), sha);

        let request = self.authorized(HttpRequest::put(&url), token).json(&body)?;
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            warn!(
                "写入 {} 失败: {} {}",
                path,
                response.status,
                truncate_text(&response.body, 200)
            );
            return Err(AppError::remote_api(response.status, response.body));
        }

        let raw: Value = response.json()?;
        let blob = raw
            .get("content")
            .cloned()
            .and_then(|content| serde_json::from_value(content).ok());

        info!(
            "✓ 已{} {}/{}",
            if sha.is_some() { "更新" } else { "新建" },
            repo,
            path
        );

        Ok(UpsertResult {
            created: sha.is_none(),
            blob,
            raw,
        })
    }

    fn authorized(&self, request: HttpRequest, token: &str) -> HttpRequest {
        request
            .header("Authorization", format!("token {}", token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", ACCEPT)
    }
}
