//! 题目记录与同步配置的存取 - 业务能力层
//!
//! 两者都只有整体读、整体写；修改都是"读出 → 改副本 → 写回"，并发时后写者胜出

use crate::error::AppResult;
use crate::infrastructure::KeyValueStore;
use crate::models::{ProblemMap, ProblemRecord, Submission, SyncConfig};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

/// problems 映射的存储键
pub const PROBLEMS_KEY: &str = "problems";
/// 同步配置的存储键
pub const CONFIG_KEY: &str = "csesConfig";

/// 题目记录存储
pub struct ProblemStore<S> {
    store: S,
}

impl<S: KeyValueStore> ProblemStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 读出整个映射（从未写过时为空）
    pub async fn get_all(&self) -> AppResult<ProblemMap> {
        match self.store.get(PROBLEMS_KEY).await? {
            Some(Value::Null) | None => Ok(ProblemMap::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// 整体写回
    pub async fn set_all(&self, problems: &ProblemMap) -> AppResult<()> {
        self.store
            .set(PROBLEMS_KEY, serde_json::to_value(problems)?)
            .await
    }

    /// 标记解决状态
    ///
    /// # 返回
    /// 更新后的记录
    pub async fn save_status(
        &self,
        problem_id: &str,
        solved: bool,
        title: Option<&str>,
        url: Option<&str>,
    ) -> AppResult<ProblemRecord> {
        let mut problems = self.get_all().await?;
        let record = problems.entry(problem_id.to_string()).or_default();
        record.apply_status(solved, title, url, Utc::now());
        let updated = record.clone();
        self.set_all(&problems).await?;

        info!(
            "📝 题目 {} 标记为{}",
            problem_id,
            if solved { "已解决" } else { "未解决" }
        );
        Ok(updated)
    }

    /// 记录一次提交（标记为已解决，替换上次提交）
    ///
    /// # 返回
    /// 写回后的整个映射
    pub async fn record_submission(
        &self,
        problem_id: &str,
        submission: Submission,
        title: Option<&str>,
    ) -> AppResult<ProblemMap> {
        let mut problems = self.get_all().await?;
        problems
            .entry(problem_id.to_string())
            .or_default()
            .apply_submission(submission, title);
        self.set_all(&problems).await?;
        debug!("题目 {} 的提交已保存到本地", problem_id);
        Ok(problems)
    }
}

/// 同步配置存储
pub struct ConfigStore<S> {
    store: S,
}

impl<S: KeyValueStore> ConfigStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 读取配置（从未保存时为默认值）
    pub async fn load(&self) -> AppResult<SyncConfig> {
        match self.store.get(CONFIG_KEY).await? {
            Some(Value::Null) | None => Ok(SyncConfig::default()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// 整体保存
    pub async fn save(&self, config: &SyncConfig) -> AppResult<()> {
        self.store
            .set(CONFIG_KEY, serde_json::to_value(config)?)
            .await
    }

    /// 只写入 token，保留其它字段
    pub async fn merge_token(&self, token: &str) -> AppResult<SyncConfig> {
        let mut config = self.load().await?;
        config.token = Some(token.to_string());
        self.save(&config).await?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_all_then_get_all_round_trips() {
        let store = ProblemStore::new(MemoryStore::new());
        assert!(store.get_all().await.unwrap().is_empty());

        let mut problems = ProblemMap::new();
        let mut record = ProblemRecord::default();
        record.apply_submission(Submission::new("code", "cpp", None), Some("Missing Number"));
        problems.insert("1083".to_string(), record);
        problems.insert("1068".to_string(), ProblemRecord::default());

        store.set_all(&problems).await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), problems);
    }

    #[tokio::test]
    async fn test_save_status_twice_keeps_first_title_and_later_time() {
        let store = ProblemStore::new(MemoryStore::new());

        let first = store
            .save_status("1068", true, Some("Weird Algorithm"), Some("https://cses.fi/problemset/task/1068"))
            .await
            .unwrap();
        let second = store.save_status("1068", true, None, None).await.unwrap();

        assert!(second.solved);
        assert!(second.at >= first.at);
        assert_eq!(second.title, "Weird Algorithm");
        assert_eq!(second.url.as_deref(), Some("https://cses.fi/problemset/task/1068"));
        assert_eq!(store.get_all().await.unwrap()["1068"], second);
    }

    #[tokio::test]
    async fn test_record_submission_replaces_previous() {
        let store = ProblemStore::new(MemoryStore::new());
        store
            .record_submission("1068", Submission::new("old", "py", None), Some("Weird Algorithm"))
            .await
            .unwrap();
        let problems = store
            .record_submission("1068", Submission::new("new", "cpp", None), None)
            .await
            .unwrap();

        let record = &problems["1068"];
        assert!(record.solved);
        assert_eq!(record.title, "Weird Algorithm");
        let last = record.last_submission.as_ref().unwrap();
        assert_eq!(last.code, "new");
        assert_eq!(last.lang, "cpp");
    }

    #[tokio::test]
    async fn test_merge_token_keeps_other_fields() {
        let shared = Arc::new(MemoryStore::new());
        let configs = ConfigStore::new(shared.clone());
        configs
            .save(&SyncConfig {
                repo: "alice/cses".to_string(),
                client_id: "cid".to_string(),
                ..SyncConfig::default()
            })
            .await
            .unwrap();

        let merged = configs.merge_token("gho_123").await.unwrap();

        assert_eq!(merged.repo, "alice/cses");
        assert_eq!(merged.client_id, "cid");
        assert_eq!(merged.token(), Some("gho_123"));
        assert_eq!(ConfigStore::new(shared).load().await.unwrap(), merged);
    }
}
