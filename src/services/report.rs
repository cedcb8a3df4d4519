//! 题目列表展示

use crate::models::ProblemMap;
use std::cmp::Ordering;

/// 最多展示的条数
pub const MAX_LISTED: usize = 200;

/// 题号排序：纯数字的按数值在前，其余按字典序在后
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// 渲染题目列表
///
/// 取排序后的前 200 条，倒序输出，每行形如
/// `✓ 1068 — Weird Algorithm [cpp] @ 2024-03-01T10:00:00Z`
pub fn render_problem_list(problems: &ProblemMap) -> Vec<String> {
    if problems.is_empty() {
        return vec!["No problems saved".to_string()];
    }

    let mut ids: Vec<&String> = problems.keys().collect();
    ids.sort_by(|a, b| compare_ids(a, b));
    ids.truncate(MAX_LISTED);

    ids.into_iter()
        .rev()
        .map(|id| {
            let record = &problems[id];
            let icon = if record.solved { '✓' } else { '○' };
            let title = if record.title.is_empty() {
                "Unknown"
            } else {
                record.title.as_str()
            };
            let lang = record
                .last_submission
                .as_ref()
                .map(|s| format!(" [{}]", s.lang))
                .unwrap_or_default();
            let at = record
                .at
                .map(|at| format!(" @ {}", at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)))
                .unwrap_or_default();
            format!("{} {} — {}{}{}", icon, id, title, lang, at)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProblemRecord, Submission};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_list() {
        assert_eq!(render_problem_list(&ProblemMap::new()), vec!["No problems saved"]);
    }

    #[test]
    fn test_lines_are_newest_id_first() {
        let mut problems = ProblemMap::new();
        let mut solved = ProblemRecord::default();
        solved.apply_submission(Submission::new("x", "cpp", None), Some("Weird Algorithm"));
        solved.at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        problems.insert("1068".to_string(), solved);
        problems.insert("999".to_string(), ProblemRecord::default());

        let lines = render_problem_list(&problems);

        assert_eq!(
            lines,
            vec![
                "✓ 1068 — Weird Algorithm [cpp] @ 2024-03-01T10:00:00Z".to_string(),
                "○ 999 — Unknown".to_string(),
            ]
        );
    }

    #[test]
    fn test_list_is_capped() {
        let problems: ProblemMap = (0..250)
            .map(|i| (i.to_string(), ProblemRecord::default()))
            .collect();

        let lines = render_problem_list(&problems);

        assert_eq!(lines.len(), MAX_LISTED);
        assert!(lines[0].starts_with("○ 199 "));
        assert!(lines[MAX_LISTED - 1].starts_with("○ 0 "));
    }
}
