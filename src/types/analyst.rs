use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 分析师画像
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema, PartialEq)]
pub struct AnalystProfile {
    /// 分析师姓名（同一团队内唯一）
    pub name: String,

    /// 专业方向，例如"公共卫生政策"
    pub specialization: String,

    /// 研究背景与关注重点
    #[serde(default, alias = "research_focus")]
    pub background: String,

    /// 专长标签
    #[serde(default)]
    pub expertise: Vec<String>,
}
