//! 按脚本应答的 HTTP 传输，用于测试和离线演练
//!
//! 预先登记 (方法, URL) → 响应；每个登记只被消费一次，按登记顺序匹配。
//! 没有登记的请求得到 404。所有请求都会被记录下来供断言

use crate::error::{AppError, AppResult};
use crate::infrastructure::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use std::sync::Mutex;

struct Route {
    method: HttpMethod,
    url: String,
    response: Option<HttpResponse>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个响应
    pub fn on(self, method: HttpMethod, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.push(method, url, Some(HttpResponse::new(status, body)));
        self
    }

    /// 登记一个传输层失败（连接被拒绝之类）
    pub fn fail(self, method: HttpMethod, url: impl Into<String>) -> Self {
        self.push(method, url, None);
        self
    }

    fn push(&self, method: HttpMethod, url: impl Into<String>, response: Option<HttpResponse>) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Route {
                method,
                url: url.into(),
                response,
            });
    }

    /// 已发出的请求（按顺序）
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 指定方法的请求
    pub fn requests_with(&self, method: HttpMethod) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let position = routes
            .iter()
            .position(|r| r.method == request.method && r.url == request.url);

        match position.map(|i| routes.remove(i)) {
            Some(Route {
                response: Some(response),
                ..
            }) => Ok(response),
            Some(Route { response: None, .. }) => Err(AppError::Other(format!(
                "connection refused: {}",
                request.url
            ))),
            None => Ok(HttpResponse::new(404, r#"{"message":"Not Found"}"#)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_are_consumed_in_order() {
        let transport = ScriptedTransport::new()
            .on(HttpMethod::Get, "https://a", 200, "first")
            .on(HttpMethod::Get, "https://a", 500, "second");

        let first = transport.send(HttpRequest::get("https://a")).await.unwrap();
        let second = transport.send(HttpRequest::get("https://a")).await.unwrap();
        let third = transport.send(HttpRequest::get("https://a")).await.unwrap();

        assert_eq!(first.body, "first");
        assert_eq!(second.status, 500);
        assert_eq!(third.status, 404);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_route_is_transport_error() {
        let transport = ScriptedTransport::new().fail(HttpMethod::Post, "https://down");
        assert!(transport.send(HttpRequest::post("https://down")).await.is_err());
    }
}
