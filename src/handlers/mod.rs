pub mod analyze;
pub mod history;
pub mod inference;
pub mod system;
pub mod upload;

pub use analyze::analyze_image;
pub use history::{get_analysis, get_average_ratings, get_image, list_scales};
pub use inference::run_inference;
pub use system::{database_health, health, storage_health, system_status};
pub use upload::upload_image;

use std::sync::Arc;

use axum::extract::Multipart;

use crate::{
    config::Config,
    database::Database,
    error::{AppError, AppResult},
    repositories::AnalysisRepository,
    services::{AnalysisOrchestrator, GroqClient},
    storage::MinioImageStore,
};

/// 生产装配下的编排器类型
pub type AppOrchestrator =
    AnalysisOrchestrator<MinioImageStore, GroqClient, AnalysisRepository>;

/// 应用程序状态
///
/// 每个依赖都是可选的：启动时连不上的服务以 `None` 装配，
/// 对应请求走降级路径而不是拒绝启动。
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: AppOrchestrator,
    pub database: Option<Database>,
    pub storage: Option<MinioImageStore>,
    pub inference: Option<Arc<GroqClient>>,
    pub repository: Option<AnalysisRepository>,
}

/// 从multipart表单中读取 `image` 字段
///
/// 返回图像字节和客户端声明的内容类型；找不到该字段按缺少
/// 图像处理。
pub(crate) async fn read_image_field(
    multipart: &mut Multipart,
) -> AppResult<(Vec<u8>, Option<String>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() == Some("image") {
            let declared_type = field.content_type().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(format!("Failed to read image field: {}", e)))?;
            return Ok((bytes.to_vec(), declared_type));
        }
    }

    Err(AppError::MissingImage)
}
