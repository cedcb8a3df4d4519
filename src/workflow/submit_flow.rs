//! 提交流程的前半段：确定要上传的代码
//!
//! 直接粘贴的代码优先；只给了 paste 地址时先拉取

use crate::error::{AppResult, FetchError};
use crate::infrastructure::HttpTransport;
use crate::services::PasteResolver;
use tracing::debug;

/// 默认扩展名
pub const DEFAULT_LANG: &str = "txt";

/// 用户填写的提交表单
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionForm {
    pub problem_id: String,
    pub title: Option<String>,
    pub lang: String,
    pub source_url: Option<String>,
    pub code: String,
}

impl SolutionForm {
    /// 扩展名，未填时为 `txt`
    pub fn lang(&self) -> &str {
        match self.lang.trim() {
            "" => DEFAULT_LANG,
            lang => lang,
        }
    }

    /// 非空的 paste 地址
    pub fn source_url(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// 确定要上传的代码
///
/// # 返回
/// 代码和 paste 地址都没有时返回 `FetchError::NothingToSubmit`
pub async fn resolve_code<T: HttpTransport>(
    resolver: &PasteResolver<T>,
    form: &SolutionForm,
) -> AppResult<String> {
    let code = form.code.trim();
    if !code.is_empty() {
        return Ok(code.to_string());
    }

    let url = form.source_url().ok_or(FetchError::NothingToSubmit)?;
    debug!("题目 {} 没有直接粘贴代码，从 {} 拉取", form.problem_id, url);

    let fetched = resolver.resolve(url).await?;
    if fetched.trim().is_empty() {
        return Err(FetchError::EmptyPaste {
            url: url.to_string(),
        }
        .into());
    }
    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::{HttpMethod, ScriptedTransport};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_pasted_code_wins_over_url() {
        let transport = Arc::new(ScriptedTransport::new());
        let form = SolutionForm {
            code: "  int main() {}\n".to_string(),
            source_url: Some("https://pastebin.com/abc".to_string()),
            ..SolutionForm::default()
        };

        let code = resolve_code(&PasteResolver::new(transport.clone()), &form).await.unwrap();

        assert_eq!(code, "int main() {}");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_url_only_fetches_paste() {
        let transport = Arc::new(ScriptedTransport::new().on(
            HttpMethod::Get,
            "https://pastebin.com/raw/abc",
            200,
            "print(1)",
        ));
        let form = SolutionForm {
            source_url: Some(" https://pastebin.com/abc ".to_string()),
            ..SolutionForm::default()
        };

        let code = resolve_code(&PasteResolver::new(transport), &form).await.unwrap();
        assert_eq!(code, "print(1)");
    }

    #[tokio::test]
    async fn test_nothing_to_submit() {
        let form = SolutionForm {
            lang: " ".to_string(),
            ..SolutionForm::default()
        };
        assert_eq!(form.lang(), "txt");

        let err = resolve_code(&PasteResolver::new(Arc::new(ScriptedTransport::new())), &form)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Fetch(FetchError::NothingToSubmit)));
    }

    #[tokio::test]
    async fn test_empty_paste_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new().on(
            HttpMethod::Get,
            "https://example.com/empty.txt",
            200,
            "\n",
        ));
        let form = SolutionForm {
            source_url: Some("https://example.com/empty.txt".to_string()),
            ..SolutionForm::default()
        };

        let err = resolve_code(&PasteResolver::new(transport), &form).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(FetchError::EmptyPaste { .. })));
    }
}
