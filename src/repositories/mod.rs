pub mod analysis;

pub use analysis::AnalysisRepository;

use crate::{
    error::AppResult,
    models::{AnalysisResult, AverageRating, ImageRecord},
};
use uuid::Uuid;

/// 分析持久化抽象接口
///
/// 写入必须在HTTP响应返回前完成或显式失败，不允许静默丢失；
/// 写入失败不会使已计算出的分析失效，由编排器记录为次要告警。
#[async_trait::async_trait]
pub trait AnalysisStore {
    /// 保存图像记录
    async fn save_image(&self, record: &ImageRecord) -> AppResult<()>;

    /// 保存分析结果
    async fn save_analysis(&self, result: &AnalysisResult) -> AppResult<()>;

    /// 按ID查询图像记录
    async fn get_image(&self, id: Uuid) -> AppResult<Option<ImageRecord>>;

    /// 按图像ID查询最新的分析结果
    async fn get_analysis(&self, image_id: Uuid) -> AppResult<Option<AnalysisResult>>;

    /// 按量表标题统计历史平均评分
    async fn get_average_ratings(&self) -> AppResult<Vec<AverageRating>>;
}
