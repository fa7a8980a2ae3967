use async_trait::async_trait;

use crate::newsroom::agent::{AgentType, NewsroomAgent, PromptTemplate, normalize_distinct};
use crate::newsroom::context::NewsroomContext;
use crate::types::{CredibilityAssessment, InterviewResponse};

#[derive(Debug, Clone)]
pub struct CredibilityBrief {
    pub topic: String,
    pub responses: Vec<InterviewResponse>,
}

/// 可信度分析师 - 评估访谈内容的可靠程度并标记可疑信号
#[derive(Default, Clone)]
pub struct CredibilityAnalyzer;

#[async_trait]
impl NewsroomAgent for CredibilityAnalyzer {
    type Input = CredibilityBrief;
    type Reply = CredibilityAssessment;
    type Output = CredibilityAssessment;

    fn agent_type(&self) -> AgentType {
        AgentType::CredibilityAnalyzer
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a fact-checking editor. You assess how credible an interview transcript is.

Evaluate:
1. Internal consistency - do the answers contradict each other?
2. Sourcing - are claims backed by named, verifiable sources?
3. Specificity - are there concrete facts rather than vague assertions?
4. Warning signs of misinformation - sensational language, unverifiable statistics, appeals to anonymous authority

Score the transcript between 0.0 (not credible) and 1.0 (fully credible)."#
                .to_string(),
            opening_instruction: "Assess the credibility of the following interview transcript:"
                .to_string(),
            closing_instruction: r#"
## Requirements
- Contradictory or unsourced answers must lower the score
- List each warning sign as a short flag
- Explain the score in the narrative"#
                .to_string(),
        }
    }

    fn format_material(&self, _context: &NewsroomContext, input: &CredibilityBrief) -> String {
        let mut material = format!("Topic: {}\n\n", input.topic);
        for (index, response) in input.responses.iter().enumerate() {
            material.push_str(&format!(
                "Q{}: {}\nA{}: {}\n",
                index + 1,
                response.question,
                index + 1,
                response.answer
            ));
            if !response.sources.is_empty() {
                material.push_str(&format!("Sources: {}\n", response.sources.join("; ")));
            }
            material.push('\n');
        }
        material
    }

    fn check_input(&self, input: &CredibilityBrief) -> Result<(), String> {
        if input.responses.is_empty() {
            return Err("访谈没有任何回答".to_string());
        }
        Ok(())
    }

    fn validate(
        &self,
        _input: &CredibilityBrief,
        reply: &CredibilityAssessment,
    ) -> Result<CredibilityAssessment, String> {
        if !reply.score.is_finite() {
            return Err(format!("可信度不是有效数字: {}", reply.score));
        }
        let narrative = reply.narrative.trim();
        if narrative.is_empty() {
            return Err("评估说明为空".to_string());
        }

        Ok(CredibilityAssessment {
            score: reply.score.clamp(0.0, 1.0),
            flags: normalize_distinct(&reply.flags),
            narrative: narrative.to_string(),
            verified_facts: normalize_distinct(&reply.verified_facts),
            recommendations: normalize_distinct(&reply.recommendations),
        })
    }
}
