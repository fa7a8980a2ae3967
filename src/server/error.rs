use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::newsroom::WorkflowError;
use crate::newsroom::agent::AgentError;
use crate::server::response::ApiResponse;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        ApiError::Workflow(WorkflowError::Agent(err))
    }
}

fn store_status(err: &StoreError) -> (StatusCode, &'static str) {
    match err {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFound"),
        StoreError::InvalidTransition { .. } | StoreError::StaleStatus { .. } => {
            (StatusCode::CONFLICT, "StatusConflict")
        }
        StoreError::Duplicate(_) => (StatusCode::CONFLICT, "Duplicate"),
        StoreError::Invalid(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        StoreError::Database(_) | StoreError::Migrate(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError")
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Store(err) => store_status(err),
            ApiError::Workflow(err) => match err {
                WorkflowError::Store(err) => store_status(err),
                WorkflowError::Agent(AgentError::InvalidInput { .. }) => {
                    (StatusCode::BAD_REQUEST, "InvalidInput")
                }
                WorkflowError::Agent(_) => (StatusCode::BAD_GATEWAY, "ModelError"),
                WorkflowError::AlreadyRunning(_) => (StatusCode::CONFLICT, "AlreadyRunning"),
                WorkflowError::ReportNotAllowed(_) | WorkflowError::NoCompletedInterviews => {
                    (StatusCode::BAD_REQUEST, "ReportNotAllowed")
                }
                WorkflowError::Cancelled => (StatusCode::CONFLICT, "Cancelled"),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status_code();
        if status_code.is_server_error() {
            tracing::error!("❌ {}: {}", error_type, self);
        }

        let error_message = match &self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                msg.clone()
            }
            // 不把数据库细节暴露给调用方
            ApiError::Store(StoreError::Database(_) | StoreError::Migrate(_))
            | ApiError::Workflow(WorkflowError::Store(
                StoreError::Database(_) | StoreError::Migrate(_),
            )) => format!("{}: 数据库操作失败", error_type),
            _ => self.to_string(),
        };
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
