use serde::Serialize;

/// 从题目页面解析出的信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemPage {
    pub problem_id: String,
    pub title: String,
}
