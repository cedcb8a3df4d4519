use crate::error::{AppError, AppResult};
use chromiumoxide::{Browser, BrowserConfig, Handler};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// 连接到已开启调试端口的浏览器，连不上时启动一个有界面的新浏览器
///
/// # 参数
/// - `port`: 远程调试端口
///
/// # 返回
/// 浏览器句柄；事件循环已在后台运行
pub async fn connect_or_launch(port: u16) -> AppResult<Browser> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = match Browser::connect(&browser_url).await {
        Ok(pair) => {
            debug!("浏览器连接成功");
            pair
        }
        Err(e) => {
            warn!("⚠️ 连接浏览器失败 ({})，改为启动新的浏览器窗口", e);
            launch_headed().await?
        }
    };

    spawn_event_loop(handler);

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(browser)
}

/// 授权页需要用户操作，所以这里不用无头模式
async fn launch_headed() -> AppResult<(Browser, Handler)> {
    info!("🚀 启动浏览器...");

    let config = BrowserConfig::builder().with_head().build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::browser(format!("配置浏览器失败: {}", e))
    })?;

    let pair = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器启动成功");
    Ok(pair)
}

/// 在后台处理浏览器事件
fn spawn_event_loop(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });
}
