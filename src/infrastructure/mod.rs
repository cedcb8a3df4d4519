//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（HTTP 连接池、数据文件、授权窗口），只暴露能力，不认识题目和仓库

pub mod auth;
pub mod http;
pub mod kv_store;
pub mod scripted;

pub use auth::{AuthLauncher, AuthRedirect};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use scripted::ScriptedTransport;
