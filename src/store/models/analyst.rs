use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::store::StoreError;
use crate::types::AnalystProfile;

/// 项目中的分析师，生成后不再修改
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Analyst {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub specialization: String,
    pub background: String,
    pub expertise: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl Analyst {
    /// 写入分析师，接受事务内的连接以便与状态变更一起提交
    pub async fn create(
        conn: &mut SqliteConnection,
        project_id: Uuid,
        profile: &AnalystProfile,
    ) -> Result<Self, StoreError> {
        let analyst = sqlx::query_as::<_, Analyst>(
            r#"
            INSERT INTO analysts (id, project_id, name, specialization, background, expertise, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(&profile.name)
        .bind(&profile.specialization)
        .bind(&profile.background)
        .bind(Json(&profile.expertise))
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(analyst)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, StoreError> {
        let analyst = sqlx::query_as::<_, Analyst>(r#"SELECT * FROM analysts WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(analyst)
    }

    /// 按生成顺序返回项目的全部分析师
    pub async fn find_by_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, StoreError> {
        let analysts = sqlx::query_as::<_, Analyst>(
            r#"SELECT * FROM analysts WHERE project_id = ?1 ORDER BY rowid ASC"#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;
        Ok(analysts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::store::models::ResearchProject;

    #[tokio::test]
    async fn test_create_in_transaction_and_list() {
        let store = Store::in_memory().await.unwrap();
        let project = ResearchProject::create(&store.pool, "topic", 2).await.unwrap();

        let mut tx = store.pool.begin().await.unwrap();
        for name in ["Ana", "Ben"] {
            let profile = AnalystProfile {
                name: name.to_string(),
                specialization: "Economics".to_string(),
                background: "Trade".to_string(),
                expertise: vec!["tariffs".to_string()],
            };
            Analyst::create(&mut tx, project.id, &profile).await.unwrap();
        }
        tx.commit().await.unwrap();

        let analysts = Analyst::find_by_project(&store.pool, project.id).await.unwrap();
        let names: Vec<_> = analysts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Ben"]);
        assert_eq!(analysts[0].expertise.0, vec!["tariffs"]);

        let found = Analyst::find_by_id(&store.pool, analysts[1].id).await.unwrap();
        assert_eq!(found.map(|a| a.name), Some("Ben".to_string()));
    }

    #[tokio::test]
    async fn test_rolled_back_transaction_leaves_no_rows() {
        let store = Store::in_memory().await.unwrap();
        let project = ResearchProject::create(&store.pool, "topic", 1).await.unwrap();

        let mut tx = store.pool.begin().await.unwrap();
        let profile = AnalystProfile {
            name: "Ana".to_string(),
            specialization: "Economics".to_string(),
            background: String::new(),
            expertise: Vec::new(),
        };
        Analyst::create(&mut tx, project.id, &profile).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(
            Analyst::find_by_project(&store.pool, project.id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
