use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 访谈中的一问一答
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema, PartialEq)]
pub struct InterviewResponse {
    /// 提出的问题
    pub question: String,

    /// 专家回答
    pub answer: String,

    /// 回答中引用的信息来源
    #[serde(default)]
    pub sources: Vec<String>,

    /// 对回答可信度的简短说明
    #[serde(default)]
    pub credibility_notes: String,

    /// 可能的错误信息迹象
    #[serde(default)]
    pub misinformation_flags: Vec<String>,
}

/// 可信度评估结果
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema, PartialEq)]
pub struct CredibilityAssessment {
    /// 总体可信度（0.0-1.0）
    #[serde(alias = "overall_credibility")]
    pub score: f64,

    /// 可疑信号，例如缺乏来源、前后矛盾
    #[serde(default, alias = "fake_news_indicators")]
    pub flags: Vec<String>,

    /// 评估说明
    #[serde(alias = "credibility_assessment")]
    pub narrative: String,

    /// 可以核实的事实
    #[serde(default)]
    pub verified_facts: Vec<String>,

    /// 后续核查建议
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl CredibilityAssessment {
    pub const UNAVAILABLE_FLAG: &'static str = "assessment_unavailable";

    /// 评估失败时存储的中性结果
    pub fn unavailable(reason: &str) -> Self {
        Self {
            score: 0.5,
            flags: vec![Self::UNAVAILABLE_FLAG.to_string()],
            narrative: format!("Automatic credibility assessment failed: {}", reason),
            verified_facts: Vec::new(),
            recommendations: vec!["Verify this interview manually.".to_string()],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.flags.iter().any(|f| f == Self::UNAVAILABLE_FLAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_accepts_legacy_keys() {
        let assessment: CredibilityAssessment = serde_json::from_str(
            r#"{"overall_credibility": 0.7, "fake_news_indicators": ["no sources"], "credibility_assessment": "mixed"}"#,
        )
        .unwrap();
        assert_eq!(assessment.score, 0.7);
        assert_eq!(assessment.flags, vec!["no sources"]);
        assert_eq!(assessment.narrative, "mixed");
        assert!(assessment.verified_facts.is_empty());
    }

    #[test]
    fn test_unavailable_assessment() {
        let assessment = CredibilityAssessment::unavailable("timeout");
        assert_eq!(assessment.score, 0.5);
        assert!(assessment.is_unavailable());
        assert!(assessment.narrative.contains("timeout"));
    }
}
