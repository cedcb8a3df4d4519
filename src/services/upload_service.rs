//! 上传服务 - 业务能力层
//!
//! 两种写入：单题解答文件、整个 problems 快照

use crate::clients::{RepoContentsClient, UpsertResult};
use crate::error::{AppResult, ConfigError};
use crate::infrastructure::HttpTransport;
use crate::models::{ProblemMap, RepoId, Submission};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// slug 最大长度
pub const MAX_SLUG_LEN: usize = 100;

/// 标题转 slug
///
/// 小写，连续的非 `[a-z0-9]` 字符换成一个 `-`，去掉首尾 `-`，最长 100。
/// 结果为空时改用 `problem-<id>`
pub fn slugify(title: &str, problem_id: &str) -> String {
    let slug = slug_of(title);
    if slug.is_empty() {
        slug_of(&format!("problem-{}", problem_id))
    } else {
        slug
    }
}

fn slug_of(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    // 只含 ASCII，按字节截断安全
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// 解答文件在仓库中的路径：`{base}/{id}/{id}-{slug}.{ext}`
pub fn submission_path(base_path: &str, problem_id: &str, title: &str, lang: &str) -> String {
    let ext = if lang.trim().is_empty() { "txt" } else { lang.trim() };
    let base = base_path.trim_matches('/');
    format!(
        "{}/{}/{}-{}.{}",
        base,
        problem_id,
        problem_id,
        slugify(title, problem_id),
        ext
    )
}

/// 快照文件内容
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot<'a> {
    pub updated_at: DateTime<Utc>,
    pub problems: &'a ProblemMap,
}

/// 上传服务
pub struct UploadService<T> {
    client: RepoContentsClient<T>,
}

impl<T: HttpTransport> UploadService<T> {
    pub fn new(client: RepoContentsClient<T>) -> Self {
        Self { client }
    }

    /// 上传单题解答
    ///
    /// # 参数
    /// - `problems`: 当前的记录映射（标题从这里取）
    /// - `problem_id`: 题号
    /// - `submission`: 本次提交
    /// - `repo`: owner/name
    /// - `base_path`: 存放目录
    /// - `token`: 访问令牌
    pub async fn upload_submission(
        &self,
        problems: &ProblemMap,
        problem_id: &str,
        submission: &Submission,
        repo: &str,
        base_path: &str,
        token: &str,
    ) -> AppResult<UpsertResult> {
        if repo.trim().is_empty() || base_path.trim().is_empty() || token.trim().is_empty() {
            return Err(ConfigError::MissingUploadSettings.into());
        }
        let repo = RepoId::parse(repo)?;

        let title = problems
            .get(problem_id)
            .map(|record| record.title.as_str())
            .unwrap_or_default();
        let path = submission_path(base_path, problem_id, title, &submission.lang);
        let message = format!("Add/Update CSES solution {}", problem_id);

        info!("📤 上传题目 {} 的解答 -> {}/{}", problem_id, repo, path);

        self.client
            .upsert(&repo, &path, submission.code.as_bytes(), &message, token)
            .await
    }

    /// 把整个 problems 映射写成一个 JSON 文件
    pub async fn sync_snapshot(
        &self,
        problems: &ProblemMap,
        repo: &str,
        path: &str,
        token: &str,
    ) -> AppResult<UpsertResult> {
        if repo.trim().is_empty() || path.trim().is_empty() || token.trim().is_empty() {
            return Err(ConfigError::MissingSyncSettings.into());
        }
        let repo = RepoId::parse(repo)?;

        let snapshot = SyncSnapshot {
            updated_at: Utc::now(),
            problems,
        };
        let content = serde_json::to_string_pretty(&snapshot)?;

        info!("🔄 同步 {} 条记录 -> {}/{}", problems.len(), repo, path);

        self.client
            .upsert(&repo, path, content.as_bytes(), "CSES sync update", token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::{HttpMethod, ScriptedTransport};
    use crate::models::ProblemRecord;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde_json::Value;
    use std::sync::Arc;

    fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug.len() <= MAX_SLUG_LEN
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
            && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn test_slugify_examples() {
        assert_eq!(slugify("Weird Algorithm", "1068"), "weird-algorithm");
        assert_eq!(slugify("  Two Sets II!! ", "1093"), "two-sets-ii");
        assert_eq!(slugify("Café -- Crème", "1"), "caf-cr-me");
        assert_eq!(slugify("", "1068"), "problem-1068");
        assert_eq!(slugify("?!*&", "1068"), "problem-1068");
    }

    #[test]
    fn test_slugify_is_total_and_idempotent() {
        let long = "a-".repeat(60) + "tail";
        let titles = [
            "Weird Algorithm",
            "",
            "---",
            "ÄÖÜ",
            "x".repeat(250).as_str(),
            long.as_str(),
            "Grid Paths (hard)",
            "数字三角形",
        ]
        .map(str::to_string);

        for title in &titles {
            let slug = slugify(title, "42");
            assert!(is_valid_slug(&slug), "bad slug {slug:?} for {title:?}");
            assert_eq!(slugify(&slug, "42"), slug);
        }
    }

    #[test]
    fn test_slug_cap_does_not_leave_trailing_hyphen() {
        let title = format!("{} tail", "a".repeat(99));
        let slug = slugify(&title, "1");
        assert_eq!(slug, "a".repeat(99));
    }

    #[test]
    fn test_submission_path() {
        assert_eq!(
            submission_path("solutions", "1068", "Weird Algorithm", "cpp"),
            "solutions/1068/1068-weird-algorithm.cpp"
        );
        assert_eq!(
            submission_path("cses/", "1068", "", ""),
            "cses/1068/1068-problem-1068.txt"
        );
    }

    #[tokio::test]
    async fn test_upload_submission_requires_settings() {
        let transport = Arc::new(ScriptedTransport::new());
        let service = UploadService::new(RepoContentsClient::new(transport.clone(), "https://api.github.com"));
        let submission = Submission::new("x", "cpp", None);

        let missing = service
            .upload_submission(&ProblemMap::new(), "1068", &submission, "alice/cses", "solutions", "")
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::Config(ConfigError::MissingUploadSettings)));

        let malformed = service
            .upload_submission(&ProblemMap::new(), "1068", &submission, "alice", "solutions", "t")
            .await
            .unwrap_err();
        assert!(matches!(malformed, AppError::Config(ConfigError::MalformedRepo { .. })));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_submission_uses_record_title() {
        let url = "https://api.github.com/repos/alice/cses/contents/solutions/1068/1068-weird-algorithm.py";
        let transport = Arc::new(ScriptedTransport::new().on(HttpMethod::Put, url, 201, "{}"));
        let service = UploadService::new(RepoContentsClient::new(transport.clone(), "https://api.github.com"));

        let mut problems = ProblemMap::new();
        problems.insert(
            "1068".to_string(),
            ProblemRecord {
                title: "Weird Algorithm".to_string(),
                ..ProblemRecord::default()
            },
        );

        service
            .upload_submission(&problems, "1068", &Submission::new("print(1)", "py", None), "alice/cses", "solutions", "t")
            .await
            .unwrap();

        let put = &transport.requests_with(HttpMethod::Put)[0];
        let body = put.json_body().unwrap();
        assert_eq!(body["message"], "Add/Update CSES solution 1068");
        assert_eq!(body["content"], STANDARD.encode("print(1)"));
    }

    #[tokio::test]
    async fn test_sync_snapshot_payload() {
        let url = "https://api.github.com/repos/alice/cses/contents/progress.json";
        let transport = Arc::new(
            ScriptedTransport::new()
                .on(HttpMethod::Get, url, 200, r#"{"sha":"s1"}"#)
                .on(HttpMethod::Put, url, 200, "{}"),
        );
        let service = UploadService::new(RepoContentsClient::new(transport.clone(), "https://api.github.com"));

        let mut problems = ProblemMap::new();
        problems.insert("1068".to_string(), ProblemRecord::default());

        service
            .sync_snapshot(&problems, "alice/cses", "progress.json", "t")
            .await
            .unwrap();

        let body = transport.requests_with(HttpMethod::Put)[0].json_body().unwrap();
        assert_eq!(body["message"], "CSES sync update");
        assert_eq!(body["sha"], "s1");

        let decoded = STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
        let snapshot: Value = serde_json::from_slice(&decoded).unwrap();
        assert!(snapshot["updatedAt"].is_string());
        assert!(snapshot["problems"]["1068"].is_object());
    }

    #[tokio::test]
    async fn test_sync_snapshot_requires_path() {
        let service = UploadService::new(RepoContentsClient::new(
            Arc::new(ScriptedTransport::new()),
            "https://api.github.com",
        ));
        let err = service
            .sync_snapshot(&ProblemMap::new(), "alice/cses", "", "t")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::MissingSyncSettings)));
    }
}
