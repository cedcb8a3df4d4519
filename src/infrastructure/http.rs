//! HTTP 传输 - 基础设施层
//!
//! 持有 reqwest Client，只暴露"发一个请求，拿回状态码和正文"的能力

use crate::error::AppResult;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
}

/// 一个待发送的请求
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// 添加请求头
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 设置 JSON 正文（同时设置 Content-Type）
    pub fn json(self, body: &JsonValue) -> AppResult<Self> {
        let mut request = self.header("Content-Type", "application/json");
        request.body = Some(serde_json::to_string(body)?);
        Ok(request)
    }

    /// 查找请求头（不区分大小写）
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 正文按 JSON 解析
    pub fn json_body(&self) -> Option<JsonValue> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }
}

/// 响应：状态码和完整正文
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 正文反序列化
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// HTTP 传输能力
///
/// 不做重试，不设超时；非 2xx 不算错误，由调用方判断
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> impl Future<Output = AppResult<HttpResponse>> + Send;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    fn send(&self, request: HttpRequest) -> impl Future<Output = AppResult<HttpResponse>> + Send {
        (**self).send(request)
    }
}

/// 基于 reqwest 的传输
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        debug!("{:?} {}", request.method, request.url);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("{} -> {} ({} 字节)", request.url, status, body.len());

        Ok(HttpResponse { status, body })
    }
}
