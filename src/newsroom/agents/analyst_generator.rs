use std::collections::HashSet;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::newsroom::agent::{AgentType, NewsroomAgent, PromptTemplate, normalize_distinct};
use crate::newsroom::context::NewsroomContext;
use crate::types::AnalystProfile;

/// 组建分析师团队所需的输入
#[derive(Debug, Clone)]
pub struct AnalystBrief {
    pub topic: String,
    pub count: usize,
}

/// 分析师团队
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct AnalystTeamReply {
    /// 分析师列表，数量必须与要求一致
    pub analysts: Vec<AnalystProfile>,
}

/// 分析师生成器 - 针对调研主题组建专业方向互补的分析师团队
#[derive(Default, Clone)]
pub struct AnalystGenerator;

#[async_trait]
impl NewsroomAgent for AnalystGenerator {
    type Input = AnalystBrief;
    type Reply = AnalystTeamReply;
    type Output = Vec<AnalystProfile>;

    fn agent_type(&self) -> AgentType {
        AgentType::AnalystGenerator
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are the editor of an investigative newsroom. You assemble research teams of analysts for a news topic.

Each analyst must:
1. Cover a distinct specialization relevant to the topic (for example economics, public health, law, technology, local politics)
2. Have a unique, realistic name
3. Have a research background that explains how they will approach the topic
4. List a few short expertise tags

Together the team should examine the topic from complementary angles and be able to detect misinformation."#
                .to_string(),
            opening_instruction: "Assemble the analyst team for the following research assignment:"
                .to_string(),
            closing_instruction: r#"
## Requirements
- Return exactly the requested number of analysts
- Every analyst name must be unique
- Specializations must not overlap"#
                .to_string(),
        }
    }

    fn format_material(&self, _context: &NewsroomContext, input: &AnalystBrief) -> String {
        format!(
            "Topic: {}\nNumber of analysts: {}\n",
            input.topic, input.count
        )
    }

    fn check_input(&self, input: &AnalystBrief) -> Result<(), String> {
        if input.topic.trim().is_empty() {
            return Err("调研主题为空".to_string());
        }
        if input.count == 0 {
            return Err("分析师数量必须大于0".to_string());
        }
        Ok(())
    }

    fn validate(
        &self,
        input: &AnalystBrief,
        reply: &AnalystTeamReply,
    ) -> Result<Vec<AnalystProfile>, String> {
        if reply.analysts.len() < input.count {
            return Err(format!(
                "需要{}位分析师，模型只返回了{}位",
                input.count,
                reply.analysts.len()
            ));
        }

        let mut names = HashSet::new();
        let mut analysts = Vec::with_capacity(input.count);
        for (index, profile) in reply.analysts.iter().take(input.count).enumerate() {
            let name = profile.name.trim();
            let specialization = profile.specialization.trim();
            if name.is_empty() {
                return Err(format!("第{}位分析师缺少姓名", index + 1));
            }
            if specialization.is_empty() {
                return Err(format!("分析师 {} 缺少专业方向", name));
            }
            if !names.insert(name.to_lowercase()) {
                return Err(format!("分析师姓名重复: {}", name));
            }
            analysts.push(AnalystProfile {
                name: name.to_string(),
                specialization: specialization.to_string(),
                background: profile.background.trim().to_string(),
                expertise: normalize_distinct(&profile.expertise),
            });
        }
        Ok(analysts)
    }
}
