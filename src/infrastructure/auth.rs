//! 交互式授权窗口 - 基础设施层
//!
//! 宿主环境提供的能力：打开授权页，挂起直到拿到最终回调地址或用户取消

use crate::error::AppResult;
use std::future::Future;
use std::sync::Arc;

/// 授权窗口的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRedirect {
    /// 浏览器跳转到了回调地址（完整 URL，带 query）
    Completed(String),
    /// 用户关闭了窗口，或宿主报告取消
    Cancelled(String),
}

/// 交互式授权能力
pub trait AuthLauncher: Send + Sync {
    /// 预留给本程序的回调地址
    fn redirect_uri(&self) -> String;

    /// 打开授权页并等待结果（超时由调用方负责）
    fn launch(&self, auth_url: &str) -> impl Future<Output = AppResult<AuthRedirect>> + Send;
}

impl<L: AuthLauncher> AuthLauncher for Arc<L> {
    fn redirect_uri(&self) -> String {
        (**self).redirect_uri()
    }

    fn launch(&self, auth_url: &str) -> impl Future<Output = AppResult<AuthRedirect>> + Send {
        (**self).launch(auth_url)
    }
}
