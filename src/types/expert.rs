use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 受访专家画像
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema, PartialEq)]
pub struct ExpertProfile {
    /// 专家姓名
    pub name: String,

    /// 专业领域
    pub expertise_area: String,

    /// 履历背景，访谈时作为专家的人设
    #[serde(default)]
    pub background: String,

    /// 专家可信度（0.0-1.0）
    #[serde(default = "default_expert_credibility")]
    pub credibility_score: f64,
}

fn default_expert_credibility() -> f64 {
    0.8
}

impl ExpertProfile {
    /// 专家合成失败时使用的兜底人设
    pub fn fallback(specialization: &str) -> Self {
        Self {
            name: format!("Dr. {} Specialist", specialization),
            expertise_area: specialization.to_string(),
            background: format!(
                "Senior researcher with fifteen years of experience in {}.",
                specialization
            ),
            credibility_score: default_expert_credibility(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credibility_uses_default() {
        let profile: ExpertProfile = serde_json::from_str(
            r#"{"name": "Dr. Ada", "expertise_area": "epidemiology", "background": "WHO"}"#,
        )
        .unwrap();
        assert_eq!(profile.credibility_score, 0.8);
    }

    #[test]
    fn test_fallback_mentions_specialization() {
        let profile = ExpertProfile::fallback("Energy Markets");
        assert_eq!(profile.expertise_area, "Energy Markets");
        assert!(profile.name.contains("Energy Markets"));
        assert!(profile.background.contains("Energy Markets"));
    }
}
