//! action 消息分发 - 流程层
//!
//! 每条消息交给一个处理函数，处理函数只在 I/O 处挂起；
//! 所有错误都在这里被捕获并变成 `{ok: false, error}`，不会让进程崩溃，也不重试

use crate::clients::RepoContentsClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::{AuthLauncher, HttpTransport, KeyValueStore};
use crate::models::{Request, Response, Submission, SyncConfig, DEFAULT_BASE_PATH};
use crate::services::{
    parse_problem_page, render_problem_list, ConfigStore, OAuthService, PasteResolver,
    ProblemStore, UploadService,
};
use crate::workflow::submit_flow::{resolve_code, SolutionForm, DEFAULT_LANG};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 消息处理器
///
/// 持有所有服务；传输和存储在服务之间共享（clone 的是句柄）
pub struct MessageHandler<T, S, L> {
    problems: ProblemStore<S>,
    configs: ConfigStore<S>,
    resolver: PasteResolver<T>,
    uploader: UploadService<T>,
    oauth: OAuthService<T, S, L>,
}

impl<T, S, L> MessageHandler<T, S, L>
where
    T: HttpTransport + Clone,
    S: KeyValueStore + Clone,
    L: AuthLauncher,
{
    /// 创建新的消息处理器
    pub fn new(transport: T, store: S, launcher: L, config: &Config) -> Self {
        Self {
            problems: ProblemStore::new(store.clone()),
            configs: ConfigStore::new(store.clone()),
            resolver: PasteResolver::new(transport.clone()),
            uploader: UploadService::new(RepoContentsClient::new(
                transport.clone(),
                config.github_api_base_url.clone(),
            )),
            oauth: OAuthService::new(
                transport,
                ConfigStore::new(store),
                launcher,
                config.oauth_authorize_url.clone(),
                Duration::from_secs(config.auth_timeout_secs),
            ),
        }
    }

    /// 处理一条消息，恰好返回一个回复
    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action();
        debug!("收到 action: {}", action);

        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("❌ {} 失败: {}", action, e);
                Response::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, request: Request) -> AppResult<Response> {
        match request {
            Request::FetchPaste { url } => {
                let content = self.resolver.resolve(&url).await?;
                Ok(Response::with_content(content))
            }
            Request::UploadSubmission {
                problem_id,
                code,
                lang,
                source_url,
                title,
            } => {
                self.upload_submission(&problem_id, code, lang, source_url, title.as_deref())
                    .await
            }
            Request::StartOAuth {
                client_id,
                exchange_url,
            } => {
                self.oauth.authorize(&client_id, &exchange_url).await?;
                Ok(Response::ok())
            }
            Request::SaveStatus {
                problem_id,
                solved,
                title,
                url,
            } => {
                self.problems
                    .save_status(&problem_id, solved, title.as_deref(), url.as_deref())
                    .await?;
                Ok(Response::ok())
            }
            Request::GetAll => Ok(Response::with_problems(self.problems.get_all().await?)),
            Request::Sync { repo, path, token } => self.sync(&repo, &path, token).await,
            Request::SaveConfig {
                repo,
                base_path,
                token,
                store_token,
                client_id,
                exchange_url,
            } => {
                let config = SyncConfig {
                    repo: repo.trim().to_string(),
                    base_path: match base_path.trim() {
                        "" => DEFAULT_BASE_PATH.to_string(),
                        path => path.to_string(),
                    },
                    token: token
                        .map(|t| t.trim().to_string())
                        .filter(|t| store_token && !t.is_empty()),
                    client_id: client_id.trim().to_string(),
                    exchange_url: exchange_url.trim().to_string(),
                };
                self.configs.save(&config).await?;
                info!("💾 同步配置已保存 (repo: {})", config.repo);
                Ok(Response::with_config(config))
            }
            Request::GetConfig => Ok(Response::with_config(self.configs.load().await?)),
            Request::SubmitSolution {
                problem_id,
                title,
                lang,
                source_url,
                code,
            } => {
                let form = SolutionForm {
                    problem_id,
                    title,
                    lang,
                    source_url,
                    code,
                };
                let code = resolve_code(&self.resolver, &form).await?;
                self.upload_submission(
                    &form.problem_id,
                    code,
                    form.lang().to_string(),
                    form.source_url().map(str::to_string),
                    form.title.as_deref(),
                )
                .await
            }
            Request::ListProblems => {
                let problems = self.problems.get_all().await?;
                Ok(Response::with_lines(render_problem_list(&problems)))
            }
            Request::ParsePage { url, html } => {
                let page = parse_problem_page(&url, &html)
                    .ok_or_else(|| AppError::InvalidMessage(format!("not a problem page: {}", url)))?;
                Ok(Response::with_page(page))
            }
        }
    }

    /// 先在本地记为已解决，再上传；没有 token 时本地记录仍然保留
    async fn upload_submission(
        &self,
        problem_id: &str,
        code: String,
        lang: String,
        source_url: Option<String>,
        title: Option<&str>,
    ) -> AppResult<Response> {
        let lang = match lang.trim() {
            "" => DEFAULT_LANG.to_string(),
            lang => lang.to_string(),
        };
        let submission = Submission::new(code, lang, source_url);
        let problems = self
            .problems
            .record_submission(problem_id, submission.clone(), title)
            .await?;

        let config = self.configs.load().await?;
        let token = config.token().ok_or(ConfigError::NoToken)?;

        let result = self
            .uploader
            .upload_submission(
                &problems,
                problem_id,
                &submission,
                &config.repo,
                config.effective_base_path(),
                token,
            )
            .await?;
        Ok(Response::with_result(result.raw))
    }

    /// 同步快照；消息里没带 token 时用保存的 token
    async fn sync(&self, repo: &str, path: &str, token: Option<String>) -> AppResult<Response> {
        let problems = self.problems.get_all().await?;
        let token = match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => token,
            None => self
                .configs
                .load()
                .await?
                .token()
                .map(str::to_string)
                .unwrap_or_default(),
        };

        let result = self
            .uploader
            .sync_snapshot(&problems, repo, path, &token)
            .await?;
        Ok(Response::with_result(result.raw))
    }
}
