use async_trait::async_trait;
use serde::Serialize;

use crate::newsroom::agent::{AgentType, NewsroomAgent, PromptTemplate, normalize_distinct};
use crate::newsroom::context::NewsroomContext;
use crate::types::{CredibilityAssessment, FinalReport, InterviewResponse};
use crate::utils::token_estimator::TokenEstimator;

/// 没有任何评估结果时报告采用的可信度
pub const DEFAULT_REPORT_CREDIBILITY: f64 = 0.8;

/// 一场已完成访谈的全部材料
#[derive(Debug, Clone, Serialize)]
pub struct InterviewDossier {
    pub analyst_name: String,
    pub analyst_specialization: String,
    pub expert_name: String,
    pub expert_expertise: String,
    pub expert_credibility: f64,
    pub responses: Vec<InterviewResponse>,
    pub assessment: Option<CredibilityAssessment>,
}

impl InterviewDossier {
    fn render(&self, index: usize) -> String {
        let mut text = format!(
            "### Interview {}: {} ({}) with {} ({}, credibility {:.2})\n",
            index + 1,
            self.analyst_name,
            self.analyst_specialization,
            self.expert_name,
            self.expert_expertise,
            self.expert_credibility
        );
        for response in &self.responses {
            text.push_str(&format!("Q: {}\nA: {}\n", response.question, response.answer));
            if !response.sources.is_empty() {
                text.push_str(&format!("Sources: {}\n", response.sources.join("; ")));
            }
            if !response.misinformation_flags.is_empty() {
                text.push_str(&format!(
                    "Possible misinformation: {}\n",
                    response.misinformation_flags.join("; ")
                ));
            }
        }
        if let Some(assessment) = &self.assessment {
            text.push_str(&format!(
                "Credibility assessment: {:.2}. {}\n",
                assessment.score, assessment.narrative
            ));
            if !assessment.flags.is_empty() {
                text.push_str(&format!("Flags: {}\n", assessment.flags.join("; ")));
            }
        }
        text
    }
}

#[derive(Debug, Clone)]
pub struct ReportBrief {
    pub topic: String,
    pub dossiers: Vec<InterviewDossier>,
    pub human_notes: Option<String>,
}

impl ReportBrief {
    /// 已存储评估结果的平均可信度
    pub fn average_credibility(&self) -> f64 {
        let scores: Vec<f64> = self
            .dossiers
            .iter()
            .filter_map(|d| d.assessment.as_ref().map(|a| a.score))
            .collect();
        if scores.is_empty() {
            return DEFAULT_REPORT_CREDIBILITY;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// 报告撰写者 - 汇总全部访谈，形成最终调研报告
#[derive(Default, Clone)]
pub struct ReportSynthesizer;

#[async_trait]
impl NewsroomAgent for ReportSynthesizer {
    type Input = ReportBrief;
    type Reply = FinalReport;
    type Output = FinalReport;

    fn agent_type(&self) -> AgentType {
        AgentType::ReportSynthesizer
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"You are the senior editor of an investigative newsroom. You write the final research report from a set of expert interviews and their credibility assessments.

The report must:
1. Open with an executive summary a reader can act on
2. Separate verified facts from claims that may be misinformation
3. Analyse the quality of the sources that were cited
4. Present each relevant perspective fairly
5. Close with recommendations and a conclusion"#
                .to_string(),
            opening_instruction: "Write the final report for the following research project:"
                .to_string(),
            closing_instruction: r#"
## Requirements
- Base every statement on the interviews; do not invent new facts
- Weigh interviews by their credibility assessment
- Take the editor notes into account when present"#
                .to_string(),
        }
    }

    fn should_include_timestamp(&self) -> bool {
        true
    }

    fn format_material(&self, context: &NewsroomContext, input: &ReportBrief) -> String {
        let estimator = TokenEstimator::new();
        let budget = context.config.llm.max_prompt_tokens / input.dossiers.len().max(1);

        let mut material = format!("Topic: {}\n\n## Interviews\n", input.topic);
        for (index, dossier) in input.dossiers.iter().enumerate() {
            let rendered = dossier.render(index);
            if estimator.exceeds_limit(&rendered, budget) {
                tracing::debug!("访谈材料 {} 超出token预算 {}，已截断", index + 1, budget);
            }
            material.push_str(&estimator.truncate_to_budget(&rendered, budget));
            material.push('\n');
        }

        if let Some(notes) = input.human_notes.as_deref().map(str::trim)
            && !notes.is_empty()
        {
            material.push_str(&format!("\n## Editor notes\n{}\n", notes));
        }
        material
    }

    fn check_input(&self, input: &ReportBrief) -> Result<(), String> {
        if input.dossiers.is_empty() {
            return Err("没有已完成的访谈".to_string());
        }
        Ok(())
    }

    fn validate(&self, input: &ReportBrief, reply: &FinalReport) -> Result<FinalReport, String> {
        let executive_summary = reply.executive_summary.trim();
        if executive_summary.is_empty() {
            return Err("报告缺少执行摘要".to_string());
        }

        Ok(FinalReport {
            executive_summary: executive_summary.to_string(),
            key_findings: normalize_distinct(&reply.key_findings),
            verified_facts: normalize_distinct(&reply.verified_facts),
            potential_misinformation: normalize_distinct(&reply.potential_misinformation),
            source_analysis: reply.source_analysis.trim().to_string(),
            perspectives: reply
                .perspectives
                .iter()
                .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect(),
            recommendations: normalize_distinct(&reply.recommendations),
            conclusion: reply.conclusion.trim().to_string(),
            credibility_score: input.average_credibility(),
            experts_consulted: input.dossiers.len(),
            methodology: reply.methodology.trim().to_string(),
        })
    }
}
