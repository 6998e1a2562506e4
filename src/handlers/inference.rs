use std::time::Duration;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppState;
use crate::{
    error::AppError,
    models::Scale,
    services::{ImageSource, InferenceGateway},
};

/// 直连推理请求
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequest {
    /// 已托管的图像地址
    #[serde(default)]
    pub image_url: Option<String>,
}

/// 直连推理响应
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResponse {
    pub success: bool,
    pub scales: Vec<Scale>,
    /// 推理耗时（秒）
    pub processing_time: f64,
    pub model_version: String,
}

/// 对已托管的图像直接执行推理
///
/// 不走降级管线：推理失败原样以错误返回，供调用方自行处理。
#[utoipa::path(
    post,
    path = "/inference",
    tag = "analysis",
    request_body = InferenceRequest,
    responses(
        (status = 200, description = "推理完成", body = InferenceResponse),
        (status = 400, description = "缺少图像地址", body = crate::response::ErrorResponse),
        (status = 500, description = "推理失败", body = crate::response::ErrorResponse),
    )
)]
pub async fn run_inference(
    State(state): State<AppState>,
    Json(request): Json<InferenceRequest>,
) -> Result<Json<InferenceResponse>, AppError> {
    let image_url = request
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("No image data provided"))?;

    let gateway = state
        .inference
        .as_ref()
        .ok_or_else(|| AppError::inference_unavailable("推理服务未配置"))?;

    let timeout = Duration::from_secs(state.config.pipeline.inference_timeout_secs);
    let outcome = tokio::time::timeout(timeout, gateway.infer(&ImageSource::Url(image_url)))
        .await
        .map_err(|_| AppError::inference_unavailable("推理超时"))??;

    Ok(Json(InferenceResponse {
        success: true,
        scales: outcome.scales,
        processing_time: outcome.processing_time,
        model_version: outcome.model_version,
    }))
}
