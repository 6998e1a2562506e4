use axum::{
    Json,
    extract::{Multipart, State},
    http::HeaderMap,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AppState, read_image_field};
use crate::{
    error::AppError,
    intake::{IdentityPolicy, RawUpload},
    models::Scale,
};

/// 身份令牌请求头
const IDENTITY_HEADER: &str = "x-identity-token";

/// 上传并分析的响应
///
/// 降级结果同样以 `success: true` 返回，并通过 `message`
/// 告知调用方发生了什么。
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    /// 托管后的图像地址，托管失败时为空
    pub image_url: Option<String>,
    /// 有序量表序列
    pub scales: Vec<Scale>,
    /// 已落库的图像记录ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<Uuid>,
    /// 降级说明，仅降级路径上出现
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 上传图像并执行完整分析管线
///
/// 要求 `x-identity-token` 请求头携带调用方身份，缺失直接
/// 返回401，不触碰任何下游服务。
#[utoipa::path(
    post,
    path = "/upload",
    tag = "analysis",
    responses(
        (status = 200, description = "管线完成（可能为降级结果）", body = UploadResponse),
        (status = 400, description = "图像缺失、过大或类型不支持", body = crate::response::ErrorResponse),
        (status = 401, description = "缺少身份令牌", body = crate::response::ErrorResponse),
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let identity = headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let (bytes, declared_type) = read_image_field(&mut multipart).await?;

    let raw = RawUpload {
        bytes,
        declared_type,
        identity,
    };

    let outcome = state.orchestrator.run(raw, IdentityPolicy::Required).await?;

    Ok(Json(UploadResponse {
        success: true,
        image_url: outcome.image_url,
        scales: outcome.scales,
        image_id: outcome.image_id,
        message: outcome.message,
    }))
}
