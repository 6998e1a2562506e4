use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::AppState;
use crate::{
    catalog,
    error::AppError,
    models::{AnalysisResult, AverageRating, ImageRecord, Scale},
    repositories::{AnalysisRepository, AnalysisStore},
};

/// 取出仓库，数据库未配置时返回503
fn repository(state: &AppState) -> Result<&AnalysisRepository, AppError> {
    state
        .repository
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("数据库未配置"))
}

/// 量表目录
#[utoipa::path(
    get,
    path = "/api/scales",
    tag = "catalog",
    responses((status = 200, description = "全部14项量表及其默认值", body = [Scale]))
)]
pub async fn list_scales() -> Json<Vec<Scale>> {
    Json(catalog::default_scales())
}

/// 查询图像记录
#[utoipa::path(
    get,
    path = "/api/images/{id}",
    tag = "history",
    params(("id" = Uuid, Path, description = "图像记录ID")),
    responses(
        (status = 200, description = "图像记录", body = ImageRecord),
        (status = 404, description = "记录不存在", body = crate::response::ErrorResponse),
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ImageRecord>, AppError> {
    repository(&state)?
        .get_image(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("image {}", id)))
}

/// 查询图像的最新分析结果
#[utoipa::path(
    get,
    path = "/api/analyses/{image_id}",
    tag = "history",
    params(("image_id" = Uuid, Path, description = "图像记录ID")),
    responses(
        (status = 200, description = "最新分析结果", body = AnalysisResult),
        (status = 404, description = "记录不存在", body = crate::response::ErrorResponse),
    )
)]
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
) -> Result<Json<AnalysisResult>, AppError> {
    repository(&state)?
        .get_analysis(image_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("analysis for image {}", image_id)))
}

/// 按量表统计历史平均评分
#[utoipa::path(
    get,
    path = "/api/ratings/average",
    tag = "history",
    responses((status = 200, description = "逐量表的历史平均评分", body = [AverageRating]))
)]
pub async fn get_average_ratings(
    State(state): State<AppState>,
) -> Result<Json<Vec<AverageRating>>, AppError> {
    let averages = repository(&state)?.get_average_ratings().await?;
    Ok(Json(averages))
}
