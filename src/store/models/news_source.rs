use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::store::StoreError;

/// 新闻来源参考数据
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NewsSource {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub credibility_rating: f64,
    pub bias_rating: String,
    pub fact_check_rating: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsSource {
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub credibility_rating: f64,
    #[serde(default = "default_label")]
    pub bias_rating: String,
    #[serde(default = "default_label")]
    pub fact_check_rating: String,
}

fn default_label() -> String {
    "unknown".to_string()
}

/// 来源可信度查询结果，未收录的来源返回较低的默认值
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceAssessment {
    pub name: String,
    pub known: bool,
    pub credibility_rating: f64,
    pub bias_rating: String,
    pub fact_check_rating: String,
    pub is_verified: bool,
}

pub const DEFAULT_MIN_CREDIBILITY: f64 = 0.8;

/// (名称, 网址, 可信度, 立场)
const DEFAULT_SOURCES: [(&str, &str, f64, &str); 10] = [
    ("Reuters", "https://www.reuters.com", 0.95, "center"),
    ("Associated Press (AP)", "https://apnews.com", 0.94, "center"),
    ("BBC News", "https://www.bbc.com/news", 0.90, "center"),
    ("NPR", "https://www.npr.org", 0.89, "center"),
    ("Wall Street Journal", "https://www.wsj.com", 0.87, "center"),
    ("The Guardian", "https://www.theguardian.com", 0.85, "left"),
    ("The New York Times", "https://www.nytimes.com", 0.84, "left"),
    ("FactCheck.org", "https://www.factcheck.org", 0.96, "center"),
    ("Snopes", "https://www.snopes.com", 0.93, "center"),
    ("PolitiFact", "https://www.politifact.com", 0.91, "center"),
];

impl NewsSource {
    /// 写入内置的可信来源，已存在的同名来源保持不变，返回新写入的数量
    pub async fn seed_defaults(pool: &SqlitePool) -> Result<u64, StoreError> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;
        for (name, url, rating, bias) in DEFAULT_SOURCES {
            let result = sqlx::query(
                r#"
                INSERT INTO news_sources
                    (id, name, url, credibility_rating, bias_rating, fact_check_rating, is_verified, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, 'high', 1, ?6)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(url)
            .bind(rating)
            .bind(bias)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        if inserted > 0 {
            tracing::info!("📰 已初始化 {} 个默认新闻来源", inserted);
        }
        Ok(inserted)
    }

    /// 按可信度从高到低列出全部来源
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, StoreError> {
        let sources = sqlx::query_as::<_, NewsSource>(
            r#"SELECT * FROM news_sources ORDER BY credibility_rating DESC, name ASC"#,
        )
        .fetch_all(pool)
        .await?;
        Ok(sources)
    }

    /// 已核实且可信度不低于`min_credibility`的来源
    pub async fn find_credible(
        pool: &SqlitePool,
        min_credibility: f64,
    ) -> Result<Vec<Self>, StoreError> {
        let sources = sqlx::query_as::<_, NewsSource>(
            r#"
            SELECT * FROM news_sources
            WHERE credibility_rating >= ?1 AND is_verified = 1
            ORDER BY credibility_rating DESC, name ASC
            "#,
        )
        .bind(min_credibility)
        .fetch_all(pool)
        .await?;
        Ok(sources)
    }

    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Self>, StoreError> {
        let source = sqlx::query_as::<_, NewsSource>(
            r#"SELECT * FROM news_sources WHERE name = ?1 COLLATE NOCASE"#,
        )
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;
        Ok(source)
    }

    pub async fn assess(pool: &SqlitePool, name: &str) -> Result<SourceAssessment, StoreError> {
        let assessment = match Self::find_by_name(pool, name).await? {
            Some(source) => SourceAssessment {
                name: source.name,
                known: true,
                credibility_rating: source.credibility_rating,
                bias_rating: source.bias_rating,
                fact_check_rating: source.fact_check_rating,
                is_verified: source.is_verified,
            },
            None => SourceAssessment {
                name: name.trim().to_string(),
                known: false,
                credibility_rating: 0.3,
                bias_rating: "unknown".to_string(),
                fact_check_rating: "low".to_string(),
                is_verified: false,
            },
        };
        Ok(assessment)
    }

    /// 添加来源，新来源在人工核实前一律标记为未核实
    pub async fn create(pool: &SqlitePool, data: &CreateNewsSource) -> Result<Self, StoreError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid("来源名称不能为空".to_string()));
        }
        if !(0.0..=1.0).contains(&data.credibility_rating) {
            return Err(StoreError::Invalid(
                "可信度必须在0.0到1.0之间".to_string(),
            ));
        }

        let result = sqlx::query_as::<_, NewsSource>(
            r#"
            INSERT INTO news_sources
                (id, name, url, credibility_rating, bias_rating, fact_check_rating, is_verified, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(data.url.trim())
        .bind(data.credibility_rating)
        .bind(&data.bias_rating)
        .bind(&data.fact_check_rating)
        .bind(Utc::now())
        .fetch_one(pool)
        .await;

        match result {
            Ok(source) => Ok(source),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate(format!("新闻来源 {}", name)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
