use crate::newsroom::agent::{AgentError, NewsroomAgent};
use crate::newsroom::agents::{
    AnalystBrief, AnalystGenerator, CredibilityAnalyzer, CredibilityBrief, ExpertBrief,
    ExpertSynthesizer, InterviewBrief, InterviewSimulator, QuestionBrief, QuestionGenerator,
    ReportBrief, ReportSynthesizer,
};
use crate::newsroom::context::NewsroomContext;
use crate::types::{AnalystProfile, CredibilityAssessment, ExpertProfile, FinalReport, InterviewResponse};

/// 新闻调研智能体编排器
///
/// 每个操作对应一次模型调用，失败时返回[`AgentError`]，兜底策略由调用方决定。
#[derive(Clone)]
pub struct AgentOrchestrator {
    context: NewsroomContext,
}

impl AgentOrchestrator {
    pub fn new(context: NewsroomContext) -> Self {
        Self { context }
    }

    /// 生成恰好`count`位分析师
    pub async fn generate_analysts(
        &self,
        topic: &str,
        count: usize,
    ) -> Result<Vec<AnalystProfile>, AgentError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let brief = AnalystBrief {
            topic: topic.to_string(),
            count,
        };
        self.execute_agent(&AnalystGenerator, &brief).await
    }

    pub async fn synthesize_expert(
        &self,
        topic: &str,
        specialization: &str,
        expertise: &[String],
    ) -> Result<ExpertProfile, AgentError> {
        let brief = ExpertBrief {
            topic: topic.to_string(),
            specialization: specialization.to_string(),
            expertise: expertise.to_vec(),
        };
        self.execute_agent(&ExpertSynthesizer, &brief).await
    }

    pub async fn generate_interview_questions(
        &self,
        topic: &str,
        specialization: &str,
        expertise: &str,
    ) -> Result<Vec<String>, AgentError> {
        let brief = QuestionBrief {
            topic: topic.to_string(),
            specialization: specialization.to_string(),
            expertise: expertise.to_string(),
        };
        self.execute_agent(&QuestionGenerator, &brief).await
    }

    pub async fn conduct_interview(
        &self,
        questions: &[String],
        expert_background: &str,
        topic: &str,
    ) -> Result<Vec<InterviewResponse>, AgentError> {
        let brief = InterviewBrief {
            topic: topic.to_string(),
            expert_background: expert_background.to_string(),
            questions: questions.to_vec(),
        };
        self.execute_agent(&InterviewSimulator, &brief).await
    }

    pub async fn analyze_credibility(
        &self,
        responses: &[InterviewResponse],
        topic: &str,
    ) -> Result<CredibilityAssessment, AgentError> {
        let brief = CredibilityBrief {
            topic: topic.to_string(),
            responses: responses.to_vec(),
        };
        self.execute_agent(&CredibilityAnalyzer, &brief).await
    }

    /// 生成最终报告，可信度和专家数量以本地计算为准
    pub async fn generate_final_report(&self, brief: &ReportBrief) -> Result<FinalReport, AgentError> {
        let mut report = self.execute_agent(&ReportSynthesizer, brief).await?;
        if report.methodology.is_empty() {
            report.methodology = self
                .context
                .config
                .target_language
                .methodology_statement()
                .to_string();
        }
        Ok(report)
    }

    /// 执行单个智能体
    async fn execute_agent<A>(&self, agent: &A, input: &A::Input) -> Result<A::Output, AgentError>
    where
        A: NewsroomAgent,
    {
        tracing::info!("🤖 执行 {} 智能体...", agent.agent_type());
        let result = agent.execute(&self.context, input).await;
        match &result {
            Ok(_) => tracing::info!("✓ {} 完成", agent.agent_type()),
            Err(e) => tracing::warn!("❌ {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsroom::agent::AgentType;
    use crate::newsroom::agents::InterviewDossier;
    use crate::newsroom::test_support::{ScriptedBackend, test_context};

    #[tokio::test]
    async fn test_generate_analysts_returns_exactly_n() {
        let backend = ScriptedBackend::newsroom();
        let context = test_context(backend.clone()).await;
        let orchestrator = AgentOrchestrator::new(context);

        for count in [1, 3, 5] {
            let analysts = orchestrator.generate_analysts("Test Topic", count).await.unwrap();
            assert_eq!(analysts.len(), count);
            assert!(analysts.iter().all(|a| !a.name.is_empty()));
        }
        assert!(orchestrator.generate_analysts("Test Topic", 0).await.unwrap().is_empty());
        assert_eq!(backend.call_count(AgentType::AnalystGenerator), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_as_error() {
        let backend = ScriptedBackend::failing("connection refused");
        let orchestrator = AgentOrchestrator::new(test_context(backend).await);

        let err = orchestrator.generate_analysts("Test Topic", 3).await.unwrap_err();
        assert!(matches!(err, AgentError::Transport { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_reply_fails_closed() {
        let backend = ScriptedBackend::new(|_| Ok("I cannot help with that.".to_string()));
        let orchestrator = AgentOrchestrator::new(test_context(backend).await);

        let err = orchestrator
            .generate_interview_questions("Test Topic", "Law", "Courts")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedReply { .. }));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_accepted() {
        let backend = ScriptedBackend::new(|_| {
            Ok("```json\n{\"questions\": [\"Why now?\", \"why now?\", \"Who decided?\"]}\n```".to_string())
        });
        let orchestrator = AgentOrchestrator::new(test_context(backend).await);

        let questions = orchestrator
            .generate_interview_questions("Test Topic", "Law", "Courts")
            .await
            .unwrap();
        assert_eq!(questions, vec!["Why now?", "Who decided?"]);
    }

    #[tokio::test]
    async fn test_contradictory_transcript_scores_lower() {
        let backend = ScriptedBackend::new(|request| {
            let score = if request.user_prompt.contains("contradict") { 0.2 } else { 0.9 };
            Ok(format!(
                "{{\"score\": {}, \"flags\": [], \"narrative\": \"scored\"}}",
                score
            ))
        });
        let orchestrator = AgentOrchestrator::new(test_context(backend).await);

        let response = |answer: &str| InterviewResponse {
            question: "Did it happen?".to_string(),
            answer: answer.to_string(),
            sources: Vec::new(),
            credibility_notes: String::new(),
            misinformation_flags: Vec::new(),
        };
        let consistent = orchestrator
            .analyze_credibility(&[response("Yes, the records show it.")], "Test Topic")
            .await
            .unwrap();
        let contradictory = orchestrator
            .analyze_credibility(
                &[response("Yes."), response("No, and I contradict my earlier answer.")],
                "Test Topic",
            )
            .await
            .unwrap();

        assert!(contradictory.score < consistent.score);
        for score in [consistent.score, contradictory.score] {
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[tokio::test]
    async fn test_report_uses_local_figures_and_methodology() {
        let backend = ScriptedBackend::newsroom();
        let orchestrator = AgentOrchestrator::new(test_context(backend).await);

        let dossier = InterviewDossier {
            analyst_name: "Ana".to_string(),
            analyst_specialization: "Law".to_string(),
            expert_name: "Dr. Lee".to_string(),
            expert_expertise: "Courts".to_string(),
            expert_credibility: 0.9,
            responses: Vec::new(),
            assessment: Some(CredibilityAssessment::unavailable("test")),
        };
        let brief = ReportBrief {
            topic: "Test Topic".to_string(),
            dossiers: vec![dossier],
            human_notes: Some("Focus on court records".to_string()),
        };

        let report = orchestrator.generate_final_report(&brief).await.unwrap();
        assert_eq!(report.credibility_score, 0.5);
        assert_eq!(report.experts_consulted, 1);
        assert!(!report.methodology.is_empty());
    }
}
