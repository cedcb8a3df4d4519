//! action 消息与回复
//!
//! 每条消息带一个必填的 `action` 字段，字段名使用 camelCase，
//! 每条消息恰好得到一个 `{ok: boolean, ...}` 回复

use crate::error::{AppError, AppResult};
use crate::models::page::ProblemPage;
use crate::models::problem::ProblemMap;
use crate::models::sync_config::SyncConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 入站 action 消息
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    FetchPaste {
        url: String,
    },
    UploadSubmission {
        problem_id: String,
        #[serde(default)]
        code: String,
        #[serde(default)]
        lang: String,
        #[serde(default)]
        source_url: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    #[serde(rename = "startOAuth")]
    StartOAuth {
        #[serde(default)]
        client_id: String,
        #[serde(default)]
        exchange_url: String,
    },
    SaveStatus {
        problem_id: String,
        #[serde(default)]
        solved: bool,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
    GetAll,
    Sync {
        #[serde(default)]
        repo: String,
        #[serde(default)]
        path: String,
        #[serde(default)]
        token: Option<String>,
    },
    SaveConfig {
        #[serde(default)]
        repo: String,
        #[serde(default)]
        base_path: String,
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        store_token: bool,
        #[serde(default)]
        client_id: String,
        #[serde(default)]
        exchange_url: String,
    },
    GetConfig,
    SubmitSolution {
        problem_id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        lang: String,
        #[serde(default)]
        source_url: Option<String>,
        #[serde(default)]
        code: String,
    },
    ListProblems,
    ParsePage {
        url: String,
        #[serde(default)]
        html: String,
    },
}

impl Request {
    /// 所有支持的 action 名
    pub const ACTIONS: &'static [&'static str] = &[
        "fetchPaste",
        "uploadSubmission",
        "startOAuth",
        "saveStatus",
        "getAll",
        "sync",
        "saveConfig",
        "getConfig",
        "submitSolution",
        "listProblems",
        "parsePage",
    ];

    /// action 名（用于日志）
    pub fn action(&self) -> &'static str {
        match self {
            Request::FetchPaste { .. } => "fetchPaste",
            Request::UploadSubmission { .. } => "uploadSubmission",
            Request::StartOAuth { .. } => "startOAuth",
            Request::SaveStatus { .. } => "saveStatus",
            Request::GetAll => "getAll",
            Request::Sync { .. } => "sync",
            Request::SaveConfig { .. } => "saveConfig",
            Request::GetConfig => "getConfig",
            Request::SubmitSolution { .. } => "submitSolution",
            Request::ListProblems => "listProblems",
            Request::ParsePage { .. } => "parsePage",
        }
    }
}

/// 一行输入：可选的 `id`（原样回显）加上 action 消息
#[derive(Debug)]
pub struct Envelope {
    pub id: Option<Value>,
    pub request: AppResult<Request>,
}

impl Envelope {
    /// 解析一行 JSON
    ///
    /// 缺少 action 或 action 不认识时返回 `UnknownAction`，
    /// 认识的 action 字段不合法时返回 JSON 错误
    pub fn parse(line: &str) -> Self {
        let mut value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Self {
                    id: None,
                    request: Err(e.into()),
                }
            }
        };

        let Some(object) = value.as_object_mut() else {
            return Self {
                id: None,
                request: Err(AppError::InvalidMessage("message must be a JSON object".to_string())),
            };
        };
        let id = object.remove("id");

        let action = object
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !Request::ACTIONS.contains(&action.as_str()) {
            return Self {
                id,
                request: Err(AppError::UnknownAction(action)),
            };
        }

        Self {
            id,
            request: serde_json::from_value(value).map_err(AppError::from),
        }
    }
}

/// 回复，字段按需出现
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problems: Option<ProblemMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<SyncConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<ProblemPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_content(content: String) -> Self {
        Self {
            content: Some(content),
            ..Self::ok()
        }
    }

    pub fn with_result(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::ok()
        }
    }

    pub fn with_problems(problems: ProblemMap) -> Self {
        Self {
            problems: Some(problems),
            ..Self::ok()
        }
    }

    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::ok()
        }
    }

    pub fn with_lines(lines: Vec<String>) -> Self {
        Self {
            lines: Some(lines),
            ..Self::ok()
        }
    }

    pub fn with_page(page: ProblemPage) -> Self {
        Self {
            page: Some(page),
            ..Self::ok()
        }
    }

    /// 附上请求的 id
    pub fn correlate(mut self, id: Option<Value>) -> Self {
        self.id = id;
        self
    }
}
