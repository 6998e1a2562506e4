use axum::{Json, extract::Multipart, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use super::{AppState, read_image_field};
use crate::{
    error::AppError,
    intake::{IdentityPolicy, RawUpload},
    models::Scale,
};

/// 匿名分析响应
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    /// 有序量表序列，降级时为目录默认值
    pub scales: Vec<Scale>,
}

/// 匿名图像分析
///
/// 接收multipart表单的 `image` 字段，不要求身份令牌。
/// 依赖故障被降级吸收，响应始终携带完整的量表序列。
#[utoipa::path(
    post,
    path = "/analyze",
    tag = "analysis",
    responses(
        (status = 200, description = "分析完成（可能为降级结果）", body = AnalyzeResponse),
        (status = 400, description = "图像缺失、过大或类型不支持", body = crate::response::ErrorResponse),
    )
)]
pub async fn analyze_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let (bytes, declared_type) = read_image_field(&mut multipart).await?;

    let raw = RawUpload {
        bytes,
        declared_type,
        identity: None,
    };

    let outcome = state.orchestrator.run(raw, IdentityPolicy::Optional).await?;

    Ok(Json(AnalyzeResponse {
        scales: outcome.scales,
    }))
}
