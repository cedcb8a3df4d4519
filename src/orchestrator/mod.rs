//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层持有进程级资源（本地存储、HTTP 客户端、授权窗口），
//! 负责 stdin/stdout 消息循环，不做具体业务判断。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (stdin 一行 -> 一个任务 -> stdout 一行)
//!     ↓
//! workflow::MessageHandler (按 action 分发)
//!     ↓
//! services (paste 解析 / 记录存储 / 上传 / OAuth / 页面解析)
//!     ↓
//! clients (RepoContentsClient)
//!     ↓
//! infrastructure (HttpTransport / KeyValueStore / AuthLauncher)
//! ```

pub mod app;

pub use app::{process_line, App, LiveHandler};
