//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建传输层、本地存储、授权窗口，组装消息处理器
//! 2. **消息循环**：从 stdin 逐行读取 action 消息，每行交给一个独立任务
//! 3. **回复输出**：所有回复经同一个通道写到 stdout，每条一行
//!
//! 日志写在 stderr，stdout 只用于回复

use crate::browser::BrowserAuthLauncher;
use crate::config::Config;
use crate::infrastructure::{
    AuthLauncher, HttpTransport, JsonFileStore, KeyValueStore, ReqwestTransport,
};
use crate::models::{Envelope, Response};
use crate::workflow::MessageHandler;
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// 生产环境的消息处理器
pub type LiveHandler = MessageHandler<ReqwestTransport, Arc<JsonFileStore>, BrowserAuthLauncher>;

/// 应用主结构
pub struct App {
    handler: Arc<LiveHandler>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(&config.data_file));
        let launcher = BrowserAuthLauncher::from_config(&config);
        let handler = MessageHandler::new(ReqwestTransport::new(), store, launcher, &config);

        info!("📂 数据文件: {}", config.data_file);

        Ok(Self {
            handler: Arc::new(handler),
        })
    }

    /// 运行消息循环，直到 stdin 关闭
    pub async fn run(&self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Response>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(response) = rx.recv().await {
                let mut line = match serde_json::to_string(&response) {
                    Ok(line) => line,
                    Err(e) => {
                        error!("序列化回复失败: {}", e);
                        continue;
                    }
                };
                line.push('\n');
                if let Err(e) = stdout.write_all(line.as_bytes()).await {
                    error!("写入 stdout 失败: {}", e);
                    break;
                }
                let _ = stdout.flush().await;
            }
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut received = 0usize;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            received += 1;

            let handler = Arc::clone(&self.handler);
            let tx = tx.clone();
            tokio::spawn(async move {
                let response = process_line(handler.as_ref(), &line).await;
                if tx.send(response).is_err() {
                    warn!("⚠️ 回复通道已关闭，丢弃一条回复");
                }
            });
        }

        drop(tx);
        if let Err(e) = writer.await {
            error!("输出任务异常退出: {}", e);
        }

        info!("👋 输入结束，共处理 {} 条消息", received);
        Ok(())
    }
}

/// 处理一行输入，恰好得到一条回复
///
/// 解析失败也会得到 `{ok: false}` 回复；带 `id` 的消息原样回显 `id`
pub async fn process_line<T, S, L>(handler: &MessageHandler<T, S, L>, line: &str) -> Response
where
    T: HttpTransport + Clone,
    S: KeyValueStore + Clone,
    L: AuthLauncher,
{
    let Envelope { id, request } = Envelope::parse(line);
    let response = match request {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            debug!("无法解析的消息: {}", line);
            warn!("❌ {}", e);
            Response::error(e.to_string())
        }
    };
    response.correlate(id)
}
