use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection, SqlitePool, Type};
use uuid::Uuid;

use crate::store::StoreError;
use crate::types::{CredibilityAssessment, InterviewResponse};

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq)]
#[sqlx(type_name = "interview_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Error,
}

impl std::fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterviewStatus::Scheduled => write!(f, "scheduled"),
            InterviewStatus::InProgress => write!(f, "in_progress"),
            InterviewStatus::Completed => write!(f, "completed"),
            InterviewStatus::Error => write!(f, "error"),
        }
    }
}

/// 一位分析师与一位专家之间的访谈
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Interview {
    pub id: Uuid,
    pub project_id: Uuid,
    pub analyst_id: Uuid,
    pub expert_id: Option<Uuid>,
    pub questions: Json<Vec<String>>,
    pub responses: Json<Vec<InterviewResponse>>,
    pub assessment: Option<Json<CredibilityAssessment>>,
    pub status: InterviewStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Interview {
    /// 为分析师安排访谈，已存在时不重复创建，返回是否新建
    pub async fn schedule(
        conn: &mut SqliteConnection,
        project_id: Uuid,
        analyst_id: Uuid,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO interviews (id, project_id, analyst_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (project_id, analyst_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(analyst_id)
        .bind(InterviewStatus::Scheduled)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, StoreError> {
        let interview = sqlx::query_as::<_, Interview>(r#"SELECT * FROM interviews WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(interview)
    }

    pub async fn find_by_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, StoreError> {
        let interviews = sqlx::query_as::<_, Interview>(
            r#"SELECT * FROM interviews WHERE project_id = ?1 ORDER BY rowid ASC"#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;
        Ok(interviews)
    }

    /// 认领访谈（scheduled → in_progress），只有一个调用方能认领成功
    pub async fn claim(pool: &SqlitePool, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"UPDATE interviews SET status = ?1, error = NULL WHERE id = ?2 AND status = ?3"#,
        )
        .bind(InterviewStatus::InProgress)
        .bind(id)
        .bind(InterviewStatus::Scheduled)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn attach_expert(
        pool: &SqlitePool,
        id: Uuid,
        expert_id: Uuid,
    ) -> Result<(), StoreError> {
        sqlx::query(r#"UPDATE interviews SET expert_id = ?1 WHERE id = ?2"#)
            .bind(expert_id)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// 保存访谈结果，只对进行中的访谈生效
    pub async fn complete(
        pool: &SqlitePool,
        id: Uuid,
        questions: &[String],
        responses: &[InterviewResponse],
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE interviews
            SET questions = ?1, responses = ?2, status = ?3, error = NULL, completed_at = ?4
            WHERE id = ?5 AND status = ?6
            "#,
        )
        .bind(Json(questions))
        .bind(Json(responses))
        .bind(InterviewStatus::Completed)
        .bind(Utc::now())
        .bind(id)
        .bind(InterviewStatus::InProgress)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("in-progress interview", id));
        }
        Ok(())
    }

    pub async fn fail(pool: &SqlitePool, id: Uuid, error: &str) -> Result<(), StoreError> {
        sqlx::query(r#"UPDATE interviews SET status = ?1, error = ?2 WHERE id = ?3 AND status = ?4"#)
            .bind(InterviewStatus::Error)
            .bind(error)
            .bind(id)
            .bind(InterviewStatus::InProgress)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_assessment(
        pool: &SqlitePool,
        id: Uuid,
        assessment: &CredibilityAssessment,
    ) -> Result<(), StoreError> {
        sqlx::query(r#"UPDATE interviews SET assessment = ?1 WHERE id = ?2"#)
            .bind(Json(assessment))
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// 把上一次运行遗留的进行中或失败的访谈重新放回队列，返回重置数量
    pub async fn reset_unfinished(pool: &SqlitePool, project_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE interviews
            SET status = ?1, error = NULL
            WHERE project_id = ?2 AND status IN (?3, ?4)
            "#,
        )
        .bind(InterviewStatus::Scheduled)
        .bind(project_id)
        .bind(InterviewStatus::InProgress)
        .bind(InterviewStatus::Error)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::store::models::{Analyst, ProjectProgress, ResearchProject};
    use crate::types::AnalystProfile;

    async fn project_with_analysts(store: &Store, count: usize) -> (Uuid, Vec<Analyst>) {
        let project = ResearchProject::create(&store.pool, "topic", count as u32)
            .await
            .unwrap();
        let mut analysts = Vec::new();
        let mut conn = store.pool.acquire().await.unwrap();
        for i in 0..count {
            let profile = AnalystProfile {
                name: format!("Analyst {}", i),
                specialization: "Media".to_string(),
                background: String::new(),
                expertise: Vec::new(),
            };
            analysts.push(Analyst::create(&mut conn, project.id, &profile).await.unwrap());
        }
        (project.id, analysts)
    }

    fn response(question: &str) -> InterviewResponse {
        InterviewResponse {
            question: question.to_string(),
            answer: "answer".to_string(),
            sources: Vec::new(),
            credibility_notes: String::new(),
            misinformation_flags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_schedule_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        let (project_id, analysts) = project_with_analysts(&store, 2).await;

        let mut conn = store.pool.acquire().await.unwrap();
        assert!(Interview::schedule(&mut conn, project_id, analysts[0].id).await.unwrap());
        assert!(!Interview::schedule(&mut conn, project_id, analysts[0].id).await.unwrap());
        assert!(Interview::schedule(&mut conn, project_id, analysts[1].id).await.unwrap());
        drop(conn);

        let interviews = Interview::find_by_project(&store.pool, project_id).await.unwrap();
        assert_eq!(interviews.len(), 2);
        assert!(interviews.iter().all(|i| i.status == InterviewStatus::Scheduled));
    }

    #[tokio::test]
    async fn test_claim_succeeds_once() {
        let store = Store::in_memory().await.unwrap();
        let (project_id, analysts) = project_with_analysts(&store, 1).await;
        let mut conn = store.pool.acquire().await.unwrap();
        Interview::schedule(&mut conn, project_id, analysts[0].id).await.unwrap();
        drop(conn);

        let interviews = Interview::find_by_project(&store.pool, project_id).await.unwrap();
        assert!(Interview::claim(&store.pool, interviews[0].id).await.unwrap());
        assert!(!Interview::claim(&store.pool, interviews[0].id).await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_fail_and_reset() {
        let store = Store::in_memory().await.unwrap();
        let (project_id, analysts) = project_with_analysts(&store, 2).await;
        let mut conn = store.pool.acquire().await.unwrap();
        for analyst in &analysts {
            Interview::schedule(&mut conn, project_id, analyst.id).await.unwrap();
        }
        drop(conn);

        let interviews = Interview::find_by_project(&store.pool, project_id).await.unwrap();
        let (done, failed) = (interviews[0].id, interviews[1].id);

        // 未认领的访谈不能直接完成
        assert!(Interview::complete(&store.pool, done, &[], &[]).await.is_err());

        Interview::claim(&store.pool, done).await.unwrap();
        Interview::claim(&store.pool, failed).await.unwrap();
        let questions = vec!["Why?".to_string()];
        Interview::complete(&store.pool, done, &questions, &[response("Why?")])
            .await
            .unwrap();
        Interview::fail(&store.pool, failed, "model unavailable").await.unwrap();

        let progress = ResearchProject::progress(&store.pool, project_id).await.unwrap();
        assert_eq!(
            progress,
            ProjectProgress {
                analysts_created: 2,
                interviews_scheduled: 2,
                interviews_completed: 1,
                interviews_failed: 1,
                total_progress: 50.0,
            }
        );

        let completed = Interview::find_by_id(&store.pool, done).await.unwrap().unwrap();
        assert_eq!(completed.status, InterviewStatus::Completed);
        assert_eq!(completed.questions.0, questions);
        assert_eq!(completed.responses.0.len(), 1);
        assert!(completed.completed_at.is_some());

        assert_eq!(Interview::reset_unfinished(&store.pool, project_id).await.unwrap(), 1);
        let reset = Interview::find_by_id(&store.pool, failed).await.unwrap().unwrap();
        assert_eq!(reset.status, InterviewStatus::Scheduled);
        assert!(reset.error.is_none());
    }

    #[tokio::test]
    async fn test_set_assessment() {
        let store = Store::in_memory().await.unwrap();
        let (project_id, analysts) = project_with_analysts(&store, 1).await;
        let mut conn = store.pool.acquire().await.unwrap();
        Interview::schedule(&mut conn, project_id, analysts[0].id).await.unwrap();
        drop(conn);

        let id = Interview::find_by_project(&store.pool, project_id).await.unwrap()[0].id;
        let assessment = CredibilityAssessment::unavailable("timeout");
        Interview::set_assessment(&store.pool, id, &assessment).await.unwrap();

        let stored = Interview::find_by_id(&store.pool, id).await.unwrap().unwrap();
        assert_eq!(stored.assessment.map(|a| a.0), Some(assessment));
    }
}
