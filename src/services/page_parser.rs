//! 题目页面解析 - 业务能力层
//!
//! 从题目页面 URL 和 HTML 中取出题号和标题

use crate::models::ProblemPage;
use crate::services::paste_resolver::decode_html_entities;
use regex::Regex;
use std::sync::LazyLock;

static TASK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"task/(\d+)").expect("static regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h1[^>]*>(.*?)</h1>").expect("static regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// 从 URL 的路径中取题号
pub fn parse_problem_id(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    TASK_ID
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 第一个 <h1> 的文本，没有时为空串
pub fn parse_title(html: &str) -> String {
    HEADING
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            let text = TAG.replace_all(m.as_str(), "");
            let text = WHITESPACE.replace_all(&text, " ");
            decode_html_entities(text.trim())
        })
        .unwrap_or_default()
}

/// 解析题目页面；不是题目页面时返回 None
pub fn parse_problem_page(url: &str, html: &str) -> Option<ProblemPage> {
    let problem_id = parse_problem_id(url)?;
    Some(ProblemPage {
        problem_id,
        title: parse_title(html),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_problem_id() {
        assert_eq!(
            parse_problem_id("https://cses.fi/problemset/task/1068"),
            Some("1068".to_string())
        );
        assert_eq!(
            parse_problem_id("https://cses.fi/problemset/task/1083/?lang=en#top"),
            Some("1083".to_string())
        );
        assert_eq!(parse_problem_id("https://cses.fi/problemset/"), None);
        assert_eq!(parse_problem_id("https://cses.fi/problemset/list?q=task/1"), None);
    }

    #[test]
    fn test_parse_title_strips_markup() {
        let html = "<div><h1 class=\"title\">\n  Weird <b>Algorithm</b> &amp; more\n</h1><h1>Other</h1></div>";
        assert_eq!(parse_title(html), "Weird Algorithm & more");
        assert_eq!(parse_title("<p>no heading</p>"), "");
    }

    #[test]
    fn test_parse_problem_page() {
        let page = parse_problem_page(
            "https://cses.fi/problemset/task/1068",
            "<h1>Weird Algorithm</h1>",
        )
        .unwrap();
        assert_eq!(page.problem_id, "1068");
        assert_eq!(page.title, "Weird Algorithm");

        assert!(parse_problem_page("https://cses.fi/", "<h1>CSES</h1>").is_none());
    }
}
