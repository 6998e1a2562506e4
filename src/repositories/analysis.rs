use super::AnalysisStore;
use crate::{
    database::Database,
    error::AppResult,
    models::{AnalysisResult, AverageRating, ImageRecord},
};
use uuid::Uuid;

/// 分析结果仓库
#[derive(Clone)]
pub struct AnalysisRepository {
    db: Database,
}

impl AnalysisRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl AnalysisStore for AnalysisRepository {
    async fn save_image(&self, record: &ImageRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO images (id, user_id, image_url, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(&record.image_url)
        .bind(record.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn save_analysis(&self, result: &AnalysisResult) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO analyses (
                id, image_id, scales, degraded, model_version, processing_time, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(result.id)
        .bind(result.image_id)
        .bind(serde_json::to_value(&result.scales)?)
        .bind(result.degraded)
        .bind(&result.model_version)
        .bind(result.processing_time)
        .bind(result.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn get_image(&self, id: Uuid) -> AppResult<Option<ImageRecord>> {
        let record = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT id, user_id, image_url, created_at
            FROM images
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record)
    }

    async fn get_analysis(&self, image_id: Uuid) -> AppResult<Option<AnalysisResult>> {
        // 一张图像可能对应多次分析，取最新一次
        let result = sqlx::query_as::<_, AnalysisResult>(
            r#"
            SELECT id, image_id, scales, degraded, model_version, processing_time, created_at
            FROM analyses
            WHERE image_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(image_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(result)
    }

    async fn get_average_ratings(&self) -> AppResult<Vec<AverageRating>> {
        // scales 以JSONB入库，展开后按标题聚合全部历史分析
        let averages = sqlx::query_as::<_, AverageRating>(
            r#"
            SELECT entry->>'title' AS title,
                   AVG((entry->>'rating')::float8) AS avg_rating
            FROM analyses,
                 jsonb_array_elements(scales) AS entry
            GROUP BY entry->>'title'
            ORDER BY title
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(averages)
    }
}
