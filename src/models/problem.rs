use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 题号 → 记录，整体读写
pub type ProblemMap = BTreeMap<String, ProblemRecord>;

/// 单题记录
///
/// 首次出现时创建，之后原地更新，不会被删除
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    #[serde(default)]
    pub solved: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_submission: Option<Submission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

/// 一次提交，创建后不再修改，重新同步时整体替换
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub code: String,
    pub lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Submission {
    pub fn new(code: impl Into<String>, lang: impl Into<String>, source_url: Option<String>) -> Self {
        Self {
            code: code.into(),
            lang: lang.into(),
            source_url: source_url.filter(|u| !u.is_empty()),
            timestamp: Utc::now(),
        }
    }
}

impl ProblemRecord {
    /// 更新“已解决”状态
    ///
    /// 未提供（或为空）的标题和链接保留旧值，上次提交原样保留
    pub fn apply_status(
        &mut self,
        solved: bool,
        title: Option<&str>,
        url: Option<&str>,
        at: DateTime<Utc>,
    ) {
        self.solved = solved;
        self.at = Some(at);
        if let Some(title) = non_empty(title) {
            self.title = title.to_string();
        }
        if let Some(url) = non_empty(url) {
            self.url = Some(url.to_string());
        }
    }

    /// 记录一次提交：标记为已解决并替换上次提交
    pub fn apply_submission(&mut self, submission: Submission, title: Option<&str>) {
        self.solved = true;
        if let Some(title) = non_empty(title) {
            self.title = title.to_string();
        }
        self.at = Some(submission.timestamp);
        self.last_submission = Some(submission);
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
