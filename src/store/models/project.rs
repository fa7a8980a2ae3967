use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection, SqlitePool, Type};
use uuid::Uuid;

use crate::store::StoreError;
use crate::types::FinalReport;

pub const MAX_TOPIC_CHARS: usize = 500;
pub const MAX_ANALYST_COUNT: u32 = 10;

/// 项目生命周期状态
///
/// 只能沿 initialized → analyzing → interviewing → reviewing → completed 逐级前进，
/// `Stopped` 是可以从任意非终止状态进入的终止状态。
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Initialized,
    Analyzing,
    Interviewing,
    Reviewing,
    Completed,
    Stopped,
}

impl ProjectStatus {
    pub const SEQUENCE: [ProjectStatus; 5] = [
        ProjectStatus::Initialized,
        ProjectStatus::Analyzing,
        ProjectStatus::Interviewing,
        ProjectStatus::Reviewing,
        ProjectStatus::Completed,
    ];

    /// 在固定流程中的位置，`Stopped` 不在流程内
    pub fn stage_index(self) -> Option<usize> {
        Self::SEQUENCE.iter().position(|s| *s == self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Stopped)
    }

    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == ProjectStatus::Stopped {
            return true;
        }
        match (self.stage_index(), next.stage_index()) {
            (Some(current), Some(next)) => next == current + 1,
            _ => false,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Initialized => write!(f, "initialized"),
            ProjectStatus::Analyzing => write!(f, "analyzing"),
            ProjectStatus::Interviewing => write!(f, "interviewing"),
            ProjectStatus::Reviewing => write!(f, "reviewing"),
            ProjectStatus::Completed => write!(f, "completed"),
            ProjectStatus::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResearchProject {
    pub id: Uuid,
    pub topic: String,
    pub analyst_count: i64,
    pub status: ProjectStatus,
    pub final_report: Option<Json<FinalReport>>,
    pub human_notes: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 状态轮询中的进度计数
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectProgress {
    pub analysts_created: i64,
    pub interviews_scheduled: i64,
    pub interviews_completed: i64,
    pub interviews_failed: i64,
    /// 已完成访谈的百分比，保留两位小数
    pub total_progress: f64,
}

fn completion_percentage(completed: i64, scheduled: i64) -> f64 {
    let ratio = completed as f64 / scheduled.max(1) as f64;
    ((ratio * 100.0).min(100.0) * 100.0).round() / 100.0
}

impl ResearchProject {
    pub async fn create(
        pool: &SqlitePool,
        topic: &str,
        analyst_count: u32,
    ) -> Result<Self, StoreError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StoreError::Invalid("调研主题不能为空".to_string()));
        }
        if topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(StoreError::Invalid(format!(
                "调研主题不能超过{}个字符",
                MAX_TOPIC_CHARS
            )));
        }
        if !(1..=MAX_ANALYST_COUNT).contains(&analyst_count) {
            return Err(StoreError::Invalid(format!(
                "分析师数量必须在1到{}之间",
                MAX_ANALYST_COUNT
            )));
        }

        let now = Utc::now();
        let project = sqlx::query_as::<_, ResearchProject>(
            r#"
            INSERT INTO research_projects (id, topic, analyst_count, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(topic)
        .bind(analyst_count as i64)
        .bind(ProjectStatus::Initialized)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, StoreError> {
        let project = sqlx::query_as::<_, ResearchProject>(
            r#"SELECT * FROM research_projects WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Self, StoreError> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| StoreError::not_found("research project", id))
    }

    /// 最近创建的项目
    pub async fn find_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, StoreError> {
        let projects = sqlx::query_as::<_, ResearchProject>(
            r#"SELECT * FROM research_projects ORDER BY created_at DESC, rowid DESC LIMIT ?1"#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// 以比较并交换的方式变更状态
    ///
    /// 只有当前状态等于`from`时才会写入，成功时同时清空`last_error`。
    /// 接受事务内的连接，方便与其它写入一起提交。
    pub async fn transition(
        conn: &mut SqliteConnection,
        id: Uuid,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> Result<(), StoreError> {
        if !from.can_transition_to(to) {
            return Err(StoreError::InvalidTransition { from, to });
        }

        let result = sqlx::query(
            r#"
            UPDATE research_projects
            SET status = ?1, last_error = NULL, updated_at = ?2
            WHERE id = ?3 AND status = ?4
            "#,
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<ProjectStatus> =
                sqlx::query_scalar(r#"SELECT status FROM research_projects WHERE id = ?1"#)
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
            return Err(match actual {
                Some(actual) => StoreError::StaleStatus {
                    expected: from,
                    actual,
                },
                None => StoreError::not_found("research project", id),
            });
        }

        Ok(())
    }

    /// 在独立连接上变更状态
    pub async fn advance(
        pool: &SqlitePool,
        id: Uuid,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> Result<(), StoreError> {
        let mut conn = pool.acquire().await?;
        Self::transition(&mut conn, id, from, to).await
    }

    /// 记录最近一次失败，`None`表示清除
    pub async fn set_last_error(
        pool: &SqlitePool,
        id: Uuid,
        message: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(r#"UPDATE research_projects SET last_error = ?1, updated_at = ?2 WHERE id = ?3"#)
            .bind(message)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_human_notes(
        pool: &SqlitePool,
        id: Uuid,
        notes: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE research_projects SET human_notes = ?1, updated_at = ?2 WHERE id = ?3"#,
        )
        .bind(notes)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("research project", id));
        }
        Ok(())
    }

    pub async fn set_final_report(
        pool: &SqlitePool,
        id: Uuid,
        report: &FinalReport,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE research_projects SET final_report = ?1, updated_at = ?2 WHERE id = ?3"#,
        )
        .bind(Json(report))
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("research project", id));
        }
        Ok(())
    }

    pub async fn progress(pool: &SqlitePool, id: Uuid) -> Result<ProjectProgress, StoreError> {
        let analysts_created: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM analysts WHERE project_id = ?1"#)
                .bind(id)
                .fetch_one(pool)
                .await?;

        let (scheduled, completed, failed): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END), 0)
            FROM interviews
            WHERE project_id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(ProjectProgress {
            analysts_created,
            interviews_scheduled: scheduled,
            interviews_completed: completed,
            interviews_failed: failed,
            total_progress: completion_percentage(completed, scheduled),
        })
    }
}
