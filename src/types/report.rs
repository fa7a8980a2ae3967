use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 最终调研报告
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema, PartialEq, Default)]
pub struct FinalReport {
    /// 执行摘要
    pub executive_summary: String,

    /// 关键发现
    #[serde(default)]
    pub key_findings: Vec<String>,

    /// 已核实的事实
    #[serde(default)]
    pub verified_facts: Vec<String>,

    /// 可能的错误信息
    #[serde(default)]
    pub potential_misinformation: Vec<String>,

    /// 信息来源分析
    #[serde(default)]
    pub source_analysis: String,

    /// 各方观点，键为视角名称
    #[serde(default)]
    pub perspectives: BTreeMap<String, String>,

    /// 建议
    #[serde(default)]
    pub recommendations: Vec<String>,

    /// 结论
    #[serde(default)]
    pub conclusion: String,

    /// 总体可信度（0.0-1.0），由已存储的评估结果计算
    #[serde(default)]
    pub credibility_score: f64,

    /// 参与访谈的专家数量
    #[serde(default)]
    pub experts_consulted: usize,

    /// 调研方法说明
    #[serde(default)]
    pub methodology: String,
}
