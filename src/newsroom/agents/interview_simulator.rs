use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::newsroom::agent::{AgentType, NewsroomAgent, PromptTemplate, normalize_distinct};
use crate::newsroom::context::NewsroomContext;
use crate::types::InterviewResponse;

#[derive(Debug, Clone)]
pub struct InterviewBrief {
    pub topic: String,
    /// 专家人设
    pub expert_background: String,
    pub questions: Vec<String>,
}

/// 访谈记录
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct InterviewTranscriptReply {
    /// 与问题一一对应、顺序一致的回答
    pub responses: Vec<InterviewResponse>,
}

/// 访谈模拟器 - 以专家身份逐条回答访谈问题
#[derive(Default, Clone)]
pub struct InterviewSimulator;

#[async_trait]
impl NewsroomAgent for InterviewSimulator {
    type Input = InterviewBrief;
    type Reply = InterviewTranscriptReply;
    type Output = Vec<InterviewResponse>;

    fn agent_type(&self) -> AgentType {
        AgentType::InterviewSimulator
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are playing the role of the expert described in the research material, being interviewed by a journalist.

For every question:
1. Answer from the expert's professional perspective, with concrete facts and figures where possible
2. Name the sources your answer relies on
3. Note how certain the answer is
4. Flag any widespread claims about the topic that you consider misinformation"#
                .to_string(),
            opening_instruction: "Conduct the following interview:".to_string(),
            closing_instruction: r#"
## Requirements
- Answer every question, in the order given
- Repeat each question verbatim in the `question` field
- Never leave an answer empty"#
                .to_string(),
        }
    }

    fn format_material(&self, _context: &NewsroomContext, input: &InterviewBrief) -> String {
        let mut material = format!(
            "Topic: {}\nExpert profile: {}\n\nQuestions:\n",
            input.topic, input.expert_background
        );
        for (index, question) in input.questions.iter().enumerate() {
            material.push_str(&format!("{}. {}\n", index + 1, question));
        }
        material
    }

    fn check_input(&self, input: &InterviewBrief) -> Result<(), String> {
        if input.questions.is_empty() {
            return Err("没有可以提问的问题".to_string());
        }
        Ok(())
    }

    fn validate(
        &self,
        input: &InterviewBrief,
        reply: &InterviewTranscriptReply,
    ) -> Result<Vec<InterviewResponse>, String> {
        if reply.responses.len() < input.questions.len() {
            return Err(format!(
                "{}个问题只得到了{}个回答",
                input.questions.len(),
                reply.responses.len()
            ));
        }

        input
            .questions
            .iter()
            .zip(&reply.responses)
            .enumerate()
            .map(|(index, (question, response))| {
                let answer = response.answer.trim();
                if answer.is_empty() {
                    return Err(format!("第{}个问题的回答为空", index + 1));
                }
                Ok(InterviewResponse {
                    question: question.clone(),
                    answer: answer.to_string(),
                    sources: normalize_distinct(&response.sources),
                    credibility_notes: response.credibility_notes.trim().to_string(),
                    misinformation_flags: normalize_distinct(&response.misinformation_flags),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief() -> InterviewBrief {
        InterviewBrief {
            topic: "Grid outages".to_string(),
            expert_background: "Power systems engineer".to_string(),
            questions: vec!["What failed?".to_string(), "Could it recur?".to_string()],
        }
    }

    fn response(question: &str, answer: &str) -> InterviewResponse {
        InterviewResponse {
            question: question.to_string(),
            answer: answer.to_string(),
            sources: vec!["ERCOT".to_string(), "ERCOT".to_string()],
            credibility_notes: String::new(),
            misinformation_flags: Vec::new(),
        }
    }

    #[test]
    fn test_responses_align_with_questions() {
        let reply = InterviewTranscriptReply {
            responses: vec![
                response("paraphrased", " Frozen gas lines. "),
                response("Could it recur?", "Yes"),
                response("Extra?", "ignored"),
            ],
        };
        let responses = InterviewSimulator.validate(&brief(), &reply).unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].question, "What failed?");
        assert_eq!(responses[0].answer, "Frozen gas lines.");
        assert_eq!(responses[0].sources, vec!["ERCOT"]);
    }

    #[test]
    fn test_missing_or_blank_answers_rejected() {
        let short = InterviewTranscriptReply {
            responses: vec![response("What failed?", "Ice")],
        };
        assert!(InterviewSimulator.validate(&brief(), &short).is_err());

        let blank = InterviewTranscriptReply {
            responses: vec![response("What failed?", "Ice"), response("Could it recur?", " ")],
        };
        assert!(InterviewSimulator.validate(&brief(), &blank).is_err());
    }

    #[test]
    fn test_no_questions_rejected_before_call() {
        let empty = InterviewBrief {
            questions: Vec::new(),
            ..brief()
        };
        assert!(InterviewSimulator.check_input(&empty).is_err());
    }
}
