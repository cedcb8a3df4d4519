//! 键值存储 - 基础设施层
//!
//! 进程内唯一的持久化映射，只有整键读写，没有字段级更新。
//! 调用方读出整个值、修改副本、再整体写回，并发写入时后写者胜出

use crate::error::{AppResult, StorageError};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 键值存储能力
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = AppResult<Option<JsonValue>>> + Send;
    fn set(&self, key: &str, value: JsonValue) -> impl Future<Output = AppResult<()>> + Send;
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = AppResult<Option<JsonValue>>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: JsonValue) -> impl Future<Output = AppResult<()>> + Send {
        (**self).set(key, value)
    }
}

/// 单个 JSON 文件里的键值存储
///
/// 文件内容是一个 JSON 对象；写入时先写临时文件再 rename
pub struct JsonFileStore {
    path: PathBuf,
    io_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// 读取整个文件，文件不存在或为空时视为空对象
    async fn read_all(&self) -> AppResult<Map<String, JsonValue>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::ReadFailed {
                    path: self.display_path(),
                    source,
                }
                .into())
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).map_err(|source| {
            StorageError::Corrupted {
                path: self.display_path(),
                source,
            }
            .into()
        })
    }

    async fn write_all(&self, data: &Map<String, JsonValue>) -> AppResult<()> {
        let write_failed = |source| StorageError::WriteFailed {
            path: self.display_path(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let content = serde_json::to_string_pretty(data)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, content).await.map_err(write_failed)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(write_failed)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        let _guard = self.io_lock.lock().await;
        let data = self.read_all().await?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
        let _guard = self.io_lock.lock().await;
        let mut data = self.read_all().await?;
        data.insert(key.to_string(), value);
        self.write_all(&data).await?;
        debug!("已写入 {} -> {}", key, self.path.display());
        Ok(())
    }
}

/// 内存中的键值存储
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.insert(key.to_string(), value);
        Ok(())
    }
}
