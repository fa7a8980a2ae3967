use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::newsroom::agent::{AgentType, NewsroomAgent, PromptTemplate, normalize_distinct};
use crate::newsroom::context::NewsroomContext;

#[derive(Debug, Clone)]
pub struct QuestionBrief {
    pub topic: String,
    pub specialization: String,
    /// 受访专家的专业领域
    pub expertise: String,
}

/// 访谈提纲
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct QuestionListReply {
    /// 按提问顺序排列的问题
    pub questions: Vec<String>,
}

/// 访谈提纲生成器
#[derive(Default, Clone)]
pub struct QuestionGenerator;

#[async_trait]
impl NewsroomAgent for QuestionGenerator {
    type Input = QuestionBrief;
    type Reply = QuestionListReply;
    type Output = Vec<String>;

    fn agent_type(&self) -> AgentType {
        AgentType::QuestionGenerator
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are an investigative journalist preparing an expert interview.

Write 5 to 7 open questions that:
1. Establish the verifiable facts of the topic
2. Probe the evidence and sources behind common claims
3. Surface competing perspectives and possible misinformation
4. Draw on the expert's specific field"#
                .to_string(),
            opening_instruction: "Prepare the interview questions for the following interview:"
                .to_string(),
            closing_instruction: "\nEach question must be distinct and self-contained.".to_string(),
        }
    }

    fn format_material(&self, _context: &NewsroomContext, input: &QuestionBrief) -> String {
        format!(
            "Topic: {}\nAnalyst specialization: {}\nExpert field: {}\n",
            input.topic, input.specialization, input.expertise
        )
    }

    fn validate(&self, _input: &QuestionBrief, reply: &QuestionListReply) -> Result<Vec<String>, String> {
        let questions = normalize_distinct(&reply.questions);
        if questions.is_empty() {
            return Err("模型没有返回任何有效问题".to_string());
        }
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief() -> QuestionBrief {
        QuestionBrief {
            topic: "Vaccine rollout".to_string(),
            specialization: "Public health".to_string(),
            expertise: "Epidemiology".to_string(),
        }
    }

    #[test]
    fn test_questions_are_trimmed_and_distinct() {
        let reply = QuestionListReply {
            questions: vec![
                " How effective is it? ".to_string(),
                "Who pays?".to_string(),
                "how effective is it?".to_string(),
                "".to_string(),
            ],
        };
        let questions = QuestionGenerator.validate(&brief(), &reply).unwrap();
        assert_eq!(questions, vec!["How effective is it?", "Who pays?"]);
    }

    #[test]
    fn test_empty_question_list_is_an_error() {
        let reply = QuestionListReply {
            questions: vec!["  ".to_string()],
        };
        assert!(QuestionGenerator.validate(&brief(), &reply).is_err());
    }
}
