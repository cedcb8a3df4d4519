//! 浏览器授权窗口
//!
//! 先在回调地址上监听，再在浏览器里打开授权页；
//! 浏览器跳到回调地址时拿到完整 URL，授权页被关掉时视为取消

use crate::browser::connection::connect_or_launch;
use crate::config::Config;
use crate::error::{AppError, AppResult, OAuthError};
use crate::infrastructure::{AuthLauncher, AuthRedirect};
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::Browser;
use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// 单个连接发出请求行的最长等待时间
const REQUEST_LINE_TIMEOUT: Duration = Duration::from_secs(10);

const DONE_PAGE: &str = "<!doctype html><meta charset=\"utf-8\"><title>cses-sync</title>\
<p>授权完成，可以关闭此窗口。</p>";

/// 用 Chrome 打开授权页的 [`AuthLauncher`]
#[derive(Debug, Clone)]
pub struct BrowserAuthLauncher {
    debug_port: u16,
    redirect_uri: String,
}

impl BrowserAuthLauncher {
    pub fn new(debug_port: u16, redirect_uri: impl Into<String>) -> Self {
        Self {
            debug_port,
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.browser_debug_port, config.oauth_redirect_uri.clone())
    }

    fn callback_address(&self) -> AppResult<(Url, String, u16)> {
        let invalid = || OAuthError::InvalidRedirect(self.redirect_uri.clone());
        let url = Url::parse(&self.redirect_uri).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?.to_string();
        let port = url.port_or_known_default().ok_or_else(invalid)?;
        Ok((url, host, port))
    }
}

impl AuthLauncher for BrowserAuthLauncher {
    fn redirect_uri(&self) -> String {
        self.redirect_uri.clone()
    }

    async fn launch(&self, auth_url: &str) -> AppResult<AuthRedirect> {
        let (callback, host, port) = self.callback_address()?;
        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|e| AppError::browser(format!("cannot listen on {}:{}: {}", host, port, e)))?;
        debug!("回调监听已就绪: {}:{}", host, port);

        let browser = connect_or_launch(self.debug_port).await?;
        let page = browser.new_page(auth_url).await?;
        let page_id = page.target_id().clone();
        info!("🌐 授权页已打开，等待用户操作");

        let outcome = tokio::select! {
            redirect = wait_for_callback(&listener, &callback) => redirect.map(AuthRedirect::Completed),
            _ = wait_for_close(&browser, &page_id) => {
                Ok(AuthRedirect::Cancelled("authorization window closed".to_string()))
            }
        };

        if let Err(e) = page.close().await {
            debug!("关闭授权页失败（可能已被用户关闭）: {}", e);
        }
        outcome
    }
}

/// 接受连接直到有请求打到回调路径上
///
/// 每个连接由单独的任务读取，浏览器预连接后不发请求的空连接不会挡住后面的回调
///
/// # 返回
/// 带 query 的完整回调 URL
async fn wait_for_callback(listener: &TcpListener, callback: &Url) -> AppResult<String> {
    let (found_tx, mut found_rx) = mpsc::channel::<String>(1);
    let expected_path = callback.path().to_string();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted
                    .map_err(|e| AppError::browser(format!("cannot accept callback connection: {}", e)))?;
                tokio::spawn(serve_connection(stream, peer, expected_path.clone(), found_tx.clone()));
            }
            Some(target) = found_rx.recv() => {
                let redirect = callback
                    .join(&target)
                    .map_err(|_| OAuthError::InvalidRedirect(target.clone()))?;
                return Ok(redirect.to_string());
            }
        }
    }
}

/// 读一个连接的请求行；命中回调路径时回复完成页并把请求目标交回
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    expected_path: String,
    found: mpsc::Sender<String>,
) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    match timeout(REQUEST_LINE_TIMEOUT, reader.read_line(&mut request_line)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            warn!("读取回调请求失败 ({}): {}", peer, e);
            return;
        }
        Err(_) => {
            debug!("连接 {} 没有发送请求，已关闭", peer);
            return;
        }
    }

    let mut stream = reader.into_inner();
    let Some(target) = callback_target(&request_line, &expected_path) else {
        debug!("忽略无关请求: {}", request_line.trim_end());
        let _ = stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await;
        return;
    };
    let target = target.to_string();

    let reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        DONE_PAGE.len(),
        DONE_PAGE
    );
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;

    let _ = found.send(target).await;
}

/// 授权页从浏览器的页面列表里消失时返回
async fn wait_for_close(browser: &Browser, page_id: &TargetId) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        interval.tick().await;
        match browser.pages().await {
            Ok(pages) if pages.iter().any(|p| p.target_id() == page_id) => {}
            Ok(_) => {
                debug!("授权页已不在页面列表中");
                return;
            }
            Err(e) => {
                warn!("获取页面列表失败，视为窗口已关闭: {}", e);
                return;
            }
        }
    }
}

/// 从请求行里取出请求目标；路径与回调路径不一致时返回 None
///
/// `GET /callback?code=abc HTTP/1.1` -> `/callback?code=abc`
fn callback_target<'a>(request_line: &'a str, expected_path: &str) -> Option<&'a str> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    let path = target.split(['?', '#']).next().unwrap_or_default();
    (path == expected_path).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_target_matches_path_only() {
        assert_eq!(
            callback_target("GET /callback?code=abc&state=1 HTTP/1.1\r\n", "/callback"),
            Some("/callback?code=abc&state=1")
        );
        assert_eq!(callback_target("GET /favicon.ico HTTP/1.1\r\n", "/callback"), None);
        assert_eq!(callback_target("POST /callback HTTP/1.1\r\n", "/callback"), None);
        assert_eq!(callback_target("", "/callback"), None);
    }

    #[test]
    fn test_callback_address_from_redirect_uri() {
        let launcher = BrowserAuthLauncher::new(9222, "http://127.0.0.1:8976/callback");
        let (url, host, port) = launcher.callback_address().unwrap();
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 8976);
        assert_eq!(url.path(), "/callback");

        let bad = BrowserAuthLauncher::new(9222, "not a url");
        assert!(bad.callback_address().is_err());
    }

    #[tokio::test]
    async fn test_wait_for_callback_skips_unrelated_requests() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let callback = Url::parse(&format!("http://127.0.0.1:{}/callback", port)).unwrap();

        let client = tokio::spawn(async move {
            for target in ["/favicon.ico", "/callback?code=xyz"] {
                let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
                let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
                stream.write_all(request.as_bytes()).await.unwrap();
                let mut reply = String::new();
                let _ = tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut reply).await;
            }
        });

        let redirect = wait_for_callback(&listener, &callback).await.unwrap();
        assert_eq!(redirect, format!("http://127.0.0.1:{}/callback?code=xyz", port));
        client.await.unwrap();
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_callback() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let callback = Url::parse(&format!("http://127.0.0.1:{}/callback", port)).unwrap();

        // 浏览器预连接：连上后一直不发请求
        let idle = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        let client = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            stream
                .write_all(b"GET /callback?code=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut reply = String::new();
            let _ = tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut reply).await;
            reply
        });

        let redirect = timeout(Duration::from_secs(3), wait_for_callback(&listener, &callback))
            .await
            .expect("空连接挡住了回调")
            .unwrap();
        assert_eq!(redirect, format!("http://127.0.0.1:{}/callback?code=xyz", port));
        assert!(client.await.unwrap().starts_with("HTTP/1.1 200 OK"));
        drop(idle);
    }
}
