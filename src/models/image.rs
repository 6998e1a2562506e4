use super::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// 图像记录
///
/// 在推理开始前创建；托管失败时 `image_url` 为空（降级模式），
/// 管线仍可继续执行。
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// 图像唯一标识符（UUID v4）
    pub id: Uuid,
    /// 提交方的不透明身份标识（当前设计中为钱包地址）
    pub user_id: String,
    /// 图像托管后的可访问地址，托管失败时为空
    pub image_url: Option<String>,
    /// 创建时间（UTC，创建后不可变）
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(user_id: String, image_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            image_url,
            created_at: Utc::now(),
        }
    }
}

impl Entity for ImageRecord {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}
