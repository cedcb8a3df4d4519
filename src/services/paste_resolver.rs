//! paste 解析服务 - 业务能力层
//!
//! 只负责"给一个 URL，拿回代码文本"，不关心题目和仓库

use crate::error::{AppResult, FetchError};
use crate::infrastructure::{HttpRequest, HttpTransport};
use phf::phf_map;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::{debug, info};

static CSES_PASTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"cses\.fi/paste/([a-f0-9]+)").expect("static regex"));
static PASTEBIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pastebin\.com/(?:raw/)?([A-Za-z0-9]+)").expect("static regex"));
static PRE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<pre[^>]*>(.*?)</pre>").expect("static regex"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:lt|gt|quot|amp|#39|apos);").expect("static regex"));

static HTML_ENTITIES: phf::Map<&'static str, &'static str> = phf_map! {
    "&lt;" => "<",
    "&gt;" => ">",
    "&quot;" => "\"",
    "&amp;" => "&",
    "&#39;" => "'",
    "&apos;" => "'",
};

/// 拿到响应后怎么取代码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// 正文就是代码
    Raw,
    /// CSES 的 HTML 页面，代码在第一个 <pre> 里
    CsesPreBlock,
}

/// 实际要请求的地址和取代码的方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub provider: &'static str,
    pub url: String,
    pub extraction: Extraction,
}

/// (匹配, 改写) 对
struct PasteProvider {
    name: &'static str,
    matches: fn(&str) -> bool,
    plan: fn(&str) -> (String, Extraction),
}

/// 按顺序匹配，第一个命中的生效；最后一项兜底
static PROVIDERS: &[PasteProvider] = &[
    PasteProvider {
        name: "cses",
        matches: is_cses_paste,
        plan: cses_plan,
    },
    PasteProvider {
        name: "pastebin",
        matches: is_pastebin,
        plan: pastebin_plan,
    },
    PasteProvider {
        name: "gist",
        matches: is_gist,
        plan: gist_plan,
    },
    PasteProvider {
        name: "generic",
        matches: any_url,
        plan: as_is_plan,
    },
];

fn is_cses_paste(url: &str) -> bool {
    CSES_PASTE.is_match(url)
}

fn cses_plan(url: &str) -> (String, Extraction) {
    let target = CSES_PASTE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| format!("https://cses.fi/paste/{}", id.as_str()))
        .unwrap_or_else(|| url.to_string());
    (target, Extraction::CsesPreBlock)
}

fn is_pastebin(url: &str) -> bool {
    PASTEBIN.is_match(url)
}

fn pastebin_plan(url: &str) -> (String, Extraction) {
    let target = PASTEBIN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| format!("https://pastebin.com/raw/{}", id.as_str()))
        .unwrap_or_else(|| url.to_string());
    (target, Extraction::Raw)
}

fn is_gist(url: &str) -> bool {
    url.contains("gist.github.com")
}

fn gist_plan(url: &str) -> (String, Extraction) {
    let target = if url.ends_with("/raw") {
        url.to_string()
    } else if url.ends_with('/') {
        format!("{}raw", url)
    } else {
        format!("{}/raw", url)
    };
    (target, Extraction::Raw)
}

fn any_url(_url: &str) -> bool {
    true
}

fn as_is_plan(url: &str) -> (String, Extraction) {
    (url.to_string(), Extraction::Raw)
}

/// 决定实际请求的地址
pub fn plan(url: &str) -> FetchPlan {
    let url = url.trim();
    PROVIDERS
        .iter()
        .find(|provider| (provider.matches)(url))
        .map(|provider| {
            let (target, extraction) = (provider.plan)(url);
            FetchPlan {
                provider: provider.name,
                url: target,
                extraction,
            }
        })
        .unwrap_or_else(|| FetchPlan {
            provider: "generic",
            url: url.to_string(),
            extraction: Extraction::Raw,
        })
}

/// 取出第一个 <pre> 块的内容（已 trim）
pub fn extract_pre_block(html: &str) -> Option<&str> {
    PRE_BLOCK
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// 解码固定的几个 HTML 实体，单遍替换
pub fn decode_html_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            HTML_ENTITIES
                .get(&caps[0])
                .map(|s| s.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// paste 解析服务
pub struct PasteResolver<T> {
    transport: T,
}

impl<T: HttpTransport> PasteResolver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// 拉取 paste 内容
    ///
    /// # 参数
    /// - `url`: 用户给的 paste 地址
    ///
    /// # 返回
    /// 代码文本；非 2xx 或页面里找不到代码时返回 `FetchError`
    pub async fn resolve(&self, url: &str) -> AppResult<String> {
        let plan = plan(url);
        info!("📥 拉取 paste [{}]: {}", plan.provider, plan.url);

        let response = self.transport.send(HttpRequest::get(&plan.url)).await?;

        match plan.extraction {
            Extraction::Raw => {
                if !response.is_success() {
                    return Err(FetchError::BadStatus {
                        status: response.status,
                        url: plan.url,
                    }
                    .into());
                }
                debug!("拿到 {} 字节", response.body.len());
                Ok(response.body)
            }
            Extraction::CsesPreBlock => {
                if !response.is_success() {
                    return Err(FetchError::CsesStatus {
                        status: response.status,
                    }
                    .into());
                }
                let code = extract_pre_block(&response.body).ok_or(FetchError::CsesNoCode)?;
                Ok(decode_html_entities(code))
            }
        }
    }
}
