use async_trait::async_trait;

use crate::newsroom::agent::{AgentType, NewsroomAgent, PromptTemplate};
use crate::newsroom::context::NewsroomContext;
use crate::types::ExpertProfile;

#[derive(Debug, Clone)]
pub struct ExpertBrief {
    pub topic: String,
    pub specialization: String,
    /// 分析师的专长标签
    pub expertise: Vec<String>,
}

/// 专家合成器 - 为分析师匹配一位可以接受访谈的领域专家
#[derive(Default, Clone)]
pub struct ExpertSynthesizer;

#[async_trait]
impl NewsroomAgent for ExpertSynthesizer {
    type Input = ExpertBrief;
    type Reply = ExpertProfile;
    type Output = ExpertProfile;

    fn agent_type(&self) -> AgentType {
        AgentType::ExpertSynthesizer
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are a newsroom booking producer. You find credible experts for analysts to interview.

Describe one expert persona with a realistic name, a precise area of expertise, a professional background (institutions, years of experience, notable work) and a credibility score between 0.0 and 1.0 that reflects how authoritative the expert is on the topic."#
                .to_string(),
            opening_instruction: "Find an expert for the following interview:".to_string(),
            closing_instruction: "\nThe expertise area must match the analyst's specialization."
                .to_string(),
        }
    }

    fn format_material(&self, _context: &NewsroomContext, input: &ExpertBrief) -> String {
        let mut material = format!(
            "Topic: {}\nAnalyst specialization: {}\n",
            input.topic, input.specialization
        );
        if !input.expertise.is_empty() {
            material.push_str(&format!("Analyst expertise: {}\n", input.expertise.join(", ")));
        }
        material
    }

    fn validate(&self, _input: &ExpertBrief, reply: &ExpertProfile) -> Result<ExpertProfile, String> {
        let name = reply.name.trim();
        if name.is_empty() {
            return Err("专家缺少姓名".to_string());
        }
        let expertise_area = reply.expertise_area.trim();
        if expertise_area.is_empty() {
            return Err(format!("专家 {} 缺少专业领域", name));
        }
        if !reply.credibility_score.is_finite() {
            return Err(format!("专家可信度不是有效数字: {}", reply.credibility_score));
        }

        Ok(ExpertProfile {
            name: name.to_string(),
            expertise_area: expertise_area.to_string(),
            background: reply.background.trim().to_string(),
            credibility_score: reply.credibility_score.clamp(0.0, 1.0),
        })
    }
}
