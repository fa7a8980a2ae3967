use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::newsroom::report::compose_final_report;
use crate::server::response::ApiResponse;
use crate::server::{ApiError, AppState};
use crate::store::models::{Analyst, Interview, ProjectProgress, ProjectStatus, ResearchProject};
use crate::types::FinalReport;

const DEFAULT_LIST_LIMIT: i64 = 5;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateProjectPayload {
    pub topic: String,
    pub analyst_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterventionAction {
    /// 结束审阅，项目进入completed
    Approve,
    /// 只保存编辑备注
    Modify,
    /// 停止项目
    Stop,
}

#[derive(Debug, Deserialize)]
pub struct InterventionPayload {
    pub notes: Option<String>,
    pub action: InterventionAction,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ResearchProject,
    pub analysts: Vec<Analyst>,
    pub interviews: Vec<Interview>,
    pub is_running: bool,
}

#[derive(Debug, Serialize)]
pub struct ProjectStatusPayload {
    pub status: ProjectStatus,
    pub progress: ProjectProgress,
    pub last_error: Option<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RunAccepted {
    pub project_id: Uuid,
    pub status: ProjectStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/{project_id}", get(get_project))
        .route("/projects/{project_id}/status", get(get_status))
        .route("/projects/{project_id}/run", post(run_project))
        .route("/projects/{project_id}/cancel", post(cancel_project))
        .route("/projects/{project_id}/intervene", post(intervene))
        .route(
            "/projects/{project_id}/report",
            get(get_report).post(generate_report),
        )
}

async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<(StatusCode, Json<ApiResponse<ResearchProject>>), ApiError> {
    let analyst_count = payload.analyst_count.unwrap_or_else(|| {
        u32::try_from(state.context().config.default_analyst_count).unwrap_or(u32::MAX)
    });
    let project = ResearchProject::create(state.pool(), &payload.topic, analyst_count).await?;
    tracing::info!("📰 新建调研项目 {}: {}", project.id, project.topic);

    // 后台运行，进度通过状态接口查询
    state.runner.trigger(project.id)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            project,
            "调研项目已创建，工作流已在后台启动",
        )),
    ))
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<ApiResponse<Vec<ResearchProject>>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let projects = ResearchProject::find_recent(state.pool(), limit).await?;
    Ok(Json(ApiResponse::success(projects)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectDetail>>, ApiError> {
    let pool = state.pool();
    let project = ResearchProject::get(pool, project_id).await?;
    let analysts = Analyst::find_by_project(pool, project_id).await?;
    let interviews = Interview::find_by_project(pool, project_id).await?;

    Ok(Json(ApiResponse::success(ProjectDetail {
        project,
        analysts,
        interviews,
        is_running: state.runner.is_running(project_id),
    })))
}

async fn get_status(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectStatusPayload>>, ApiError> {
    let pool = state.pool();
    let project = ResearchProject::get(pool, project_id).await?;
    let progress = ResearchProject::progress(pool, project_id).await?;

    Ok(Json(ApiResponse::success(ProjectStatusPayload {
        status: project.status,
        progress,
        last_error: project.last_error,
        last_updated: project.updated_at,
    })))
}

async fn run_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<RunAccepted>>), ApiError> {
    let project = ResearchProject::get(state.pool(), project_id).await?;
    if project.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "项目已处于终止状态 {}",
            project.status
        )));
    }

    state.runner.trigger(project_id)?;
    tracing::info!("▶️ 继续执行项目 {}（当前状态: {}）", project_id, project.status);

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(RunAccepted {
            project_id,
            status: project.status,
        })),
    ))
}

async fn cancel_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ResearchProject::get(state.pool(), project_id).await?;
    if !state.runner.cancel(project_id) {
        return Err(ApiError::Conflict("项目没有正在运行的工作流".to_string()));
    }
    Ok(Json(ApiResponse::success_with_message((), "已请求取消工作流")))
}

async fn intervene(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<InterventionPayload>,
) -> Result<Json<ApiResponse<ResearchProject>>, ApiError> {
    let pool = state.pool();
    let project = ResearchProject::get(pool, project_id).await?;

    let notes = payload.notes.as_deref().map(str::trim).unwrap_or_default();
    if !notes.is_empty() {
        ResearchProject::set_human_notes(pool, project_id, notes).await?;
        tracing::info!("📝 项目 {} 已保存编辑备注", project_id);
    }

    match payload.action {
        InterventionAction::Approve => {
            if project.status != ProjectStatus::Reviewing {
                return Err(ApiError::Conflict(format!(
                    "只有处于审阅阶段的项目可以批准，当前状态: {}",
                    project.status
                )));
            }
            ResearchProject::advance(
                pool,
                project_id,
                ProjectStatus::Reviewing,
                ProjectStatus::Completed,
            )
            .await?;
            tracing::info!("✓ 项目 {} 已由人工批准", project_id);
        }
        InterventionAction::Modify => {}
        InterventionAction::Stop => {
            let status = state.runner.stop(project_id).await?;
            tracing::info!("⏹️ 项目 {} 已停止，当前状态: {}", project_id, status);
        }
    }

    let project = ResearchProject::get(pool, project_id).await?;
    Ok(Json(ApiResponse::success(project)))
}

async fn generate_report(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FinalReport>>, ApiError> {
    let report = compose_final_report(state.context(), project_id).await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn get_report(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FinalReport>>, ApiError> {
    let project = ResearchProject::get(state.pool(), project_id).await?;
    let report = project
        .final_report
        .ok_or_else(|| ApiError::NotFound("项目还没有生成最终报告".to_string()))?;
    Ok(Json(ApiResponse::success(report.0)))
}
