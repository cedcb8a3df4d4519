//! # CSES Sync
//!
//! 记录 CSES 题目的解决进度，并把解答同步到 GitHub 仓库
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `HttpTransport` - 发出 HTTP 请求（生产用 reqwest，测试用脚本化传输）
//! - `KeyValueStore` - 持久化的 JSON 键值存储
//! - `AuthLauncher` - 打开授权页并等待回调
//!
//! ### ② 客户端层（Clients）
//! - `RepoContentsClient` - 仓库内容 API 的“存在则更新，否则创建”
//!
//! ### ③ 业务能力层（Services）
//! - `PasteResolver` - 把 paste 链接解析成源码
//! - `ProblemStore` / `ConfigStore` - 题目记录与同步配置
//! - `UploadService` - 单题上传与整体快照同步
//! - `OAuthService` - 授权码换 token
//!
//! ### ④ 流程层（Workflow）
//! - `MessageHandler` - 按 action 分发，错误统一变成 `{ok: false}` 回复
//!
//! ### ⑤ 编排层（Orchestration）
//! - `App` - stdin/stdout 消息循环
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{MemoryStore, ScriptedTransport};
pub use models::{Envelope, Request, Response};
pub use orchestrator::{process_line, App};
pub use workflow::MessageHandler;
