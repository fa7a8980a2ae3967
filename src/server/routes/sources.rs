use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use crate::server::response::ApiResponse;
use crate::server::{ApiError, AppState};
use crate::store::models::{CreateNewsSource, NewsSource, SourceAssessment};

#[derive(Debug, Deserialize)]
pub struct ListSourcesQuery {
    /// 只返回已验证且可信度不低于该值的来源
    pub min_credibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AssessQuery {
    pub name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sources", get(list_sources).post(add_source))
        .route("/sources/assess", get(assess_source))
}

async fn list_sources(
    State(state): State<AppState>,
    Query(query): Query<ListSourcesQuery>,
) -> Result<Json<ApiResponse<Vec<NewsSource>>>, ApiError> {
    let sources = match query.min_credibility {
        Some(min) => NewsSource::find_credible(state.pool(), min).await?,
        None => NewsSource::find_all(state.pool()).await?,
    };
    Ok(Json(ApiResponse::success(sources)))
}

async fn add_source(
    State(state): State<AppState>,
    Json(payload): Json<CreateNewsSource>,
) -> Result<(StatusCode, Json<ApiResponse<NewsSource>>), ApiError> {
    let source = NewsSource::create(state.pool(), &payload).await?;
    tracing::info!("📚 新增新闻来源: {}", source.name);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(source))))
}

async fn assess_source(
    State(state): State<AppState>,
    Query(query): Query<AssessQuery>,
) -> Result<Json<ApiResponse<SourceAssessment>>, ApiError> {
    let name = query.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::BadRequest("缺少来源名称参数 name".to_string()));
    }
    let assessment = NewsSource::assess(state.pool(), name).await?;
    Ok(Json(ApiResponse::success(assessment)))
}
