use super::{Entity, Scale};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// 一次完成的图像分析结果
///
/// 仅在推理调用结束后创建，创建后不再修改；写入一次，读取多次。
/// 不拥有图像本身，只通过 `image_id` 引用（一张图像原则上可以
/// 对应多次分析）。
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 结果唯一标识符（UUID v4）
    pub id: Uuid,
    /// 关联的图像记录ID
    pub image_id: Uuid,
    /// 有序量表序列，完整结果的长度等于目录大小（14）
    #[sqlx(json)]
    pub scales: Vec<Scale>,
    /// 是否为降级结果（由目录默认值构成，而非真实推理输出）
    pub degraded: bool,
    /// 推理模型版本，降级结果为空
    pub model_version: Option<String>,
    /// 推理耗时（秒），降级结果为空
    pub processing_time: Option<f64>,
    /// 创建时间（UTC，创建后不可变）
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(
        image_id: Uuid,
        scales: Vec<Scale>,
        degraded: bool,
        model_version: Option<String>,
        processing_time: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_id,
            scales,
            degraded,
            model_version,
            processing_time,
            created_at: Utc::now(),
        }
    }
}

impl Entity for AnalysisResult {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 单个量表的历史平均评分
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AverageRating {
    pub title: String,
    pub avg_rating: f64,
}
