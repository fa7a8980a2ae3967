use thiserror::Error;

use crate::store::models::project::ProjectStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("非法的状态变更: {from} -> {to}")]
    InvalidTransition {
        from: ProjectStatus,
        to: ProjectStatus,
    },
    #[error("项目状态已被修改: 期望 {expected}，实际 {actual}")]
    StaleStatus {
        expected: ProjectStatus,
        actual: ProjectStatus,
    },
    #[error("无效的数据: {0}")]
    Invalid(String),
    #[error("记录已存在: {0}")]
    Duplicate(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
