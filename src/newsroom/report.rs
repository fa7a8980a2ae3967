use std::collections::HashMap;

use uuid::Uuid;

use crate::newsroom::agents::{InterviewDossier, ReportBrief};
use crate::newsroom::context::NewsroomContext;
use crate::newsroom::orchestrator::AgentOrchestrator;
use crate::newsroom::workflow::WorkflowError;
use crate::store::models::{Analyst, Expert, Interview, InterviewStatus, ProjectStatus, ResearchProject};
use crate::types::FinalReport;

/// 汇总项目的已完成访谈并生成最终报告，成功后保存到项目上
///
/// 只允许在reviewing或completed状态下生成，且至少要有一场完成的访谈。
/// 生成失败时不会覆盖之前保存的报告。
pub async fn compose_final_report(
    context: &NewsroomContext,
    project_id: Uuid,
) -> Result<FinalReport, WorkflowError> {
    let pool = &context.store.pool;
    let project = ResearchProject::get(pool, project_id).await?;
    if !matches!(
        project.status,
        ProjectStatus::Reviewing | ProjectStatus::Completed
    ) {
        return Err(WorkflowError::ReportNotAllowed(project.status));
    }

    let brief = ReportBrief {
        topic: project.topic.clone(),
        dossiers: collect_dossiers(context, project_id).await?,
        human_notes: project.human_notes.clone(),
    };
    if brief.dossiers.is_empty() {
        return Err(WorkflowError::NoCompletedInterviews);
    }

    tracing::info!(
        "📝 正在根据 {} 场访谈撰写最终报告: {}",
        brief.dossiers.len(),
        project.topic
    );
    let report = AgentOrchestrator::new(context.clone())
        .generate_final_report(&brief)
        .await?;
    ResearchProject::set_final_report(pool, project_id, &report).await?;
    tracing::info!("✓ 最终报告已保存");

    Ok(report)
}

async fn collect_dossiers(
    context: &NewsroomContext,
    project_id: Uuid,
) -> Result<Vec<InterviewDossier>, WorkflowError> {
    let pool = &context.store.pool;
    let analysts: HashMap<Uuid, Analyst> = Analyst::find_by_project(pool, project_id)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let mut dossiers = Vec::new();
    for interview in Interview::find_by_project(pool, project_id).await? {
        if interview.status != InterviewStatus::Completed {
            continue;
        }
        let expert = match interview.expert_id {
            Some(expert_id) => Expert::find_by_id(pool, expert_id).await?,
            None => None,
        };
        let analyst = analysts.get(&interview.analyst_id);

        dossiers.push(InterviewDossier {
            analyst_name: analyst.map(|a| a.name.clone()).unwrap_or_else(unknown),
            analyst_specialization: analyst
                .map(|a| a.specialization.clone())
                .unwrap_or_else(unknown),
            expert_name: expert.as_ref().map(|e| e.name.clone()).unwrap_or_else(unknown),
            expert_expertise: expert
                .as_ref()
                .map(|e| e.expertise_area.clone())
                .unwrap_or_else(unknown),
            expert_credibility: expert.as_ref().map(|e| e.credibility_score).unwrap_or(0.0),
            responses: interview.responses.0,
            assessment: interview.assessment.map(|a| a.0),
        });
    }
    Ok(dossiers)
}

fn unknown() -> String {
    "Unknown".to_string()
}
