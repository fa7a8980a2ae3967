use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::store::StoreError;
use crate::types::ExpertProfile;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Expert {
    pub id: Uuid,
    pub name: String,
    pub expertise_area: String,
    pub background: String,
    pub credibility_score: f64,
    pub created_at: DateTime<Utc>,
}

impl Expert {
    pub async fn create(pool: &SqlitePool, profile: &ExpertProfile) -> Result<Self, StoreError> {
        let expert = sqlx::query_as::<_, Expert>(
            r#"
            INSERT INTO experts (id, name, expertise_area, background, credibility_score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&profile.name)
        .bind(&profile.expertise_area)
        .bind(&profile.background)
        .bind(profile.credibility_score.clamp(0.0, 1.0))
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(expert)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, StoreError> {
        let expert = sqlx::query_as::<_, Expert>(r#"SELECT * FROM experts WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(expert)
    }
}
