use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use utoipa::ToSchema;

use super::AppState;
use crate::error::AppError;
use crate::storage::ImageHost;

/// 系统状态概览
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    /// 数据库状态: healthy / unhealthy / disabled
    pub database: String,
    /// 图像托管状态: healthy / unhealthy / disabled
    pub storage: String,
    /// 推理服务状态: configured / disabled
    pub inference: String,
}

/// 存活探针
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "服务存活"))
)]
pub async fn health() -> Json<JsonValue> {
    Json(json!({
        "status": "healthy",
        "service": "FEATS Analysis API"
    }))
}

/// 系统状态
///
/// 逐个探测依赖的健康状态，未配置的依赖报告为disabled。
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "system",
    responses((status = 200, description = "系统状态概览", body = SystemStatus))
)]
pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let database = match &state.database {
        Some(db) => match db.health_check().await {
            Ok(true) => "healthy",
            _ => "unhealthy",
        },
        None => "disabled",
    };

    let storage = match &state.storage {
        Some(store) => match store.health_check().await {
            Ok(true) => "healthy",
            _ => "unhealthy",
        },
        None => "disabled",
    };

    let inference = if state.inference.is_some() {
        "configured"
    } else {
        "disabled"
    };

    Json(SystemStatus {
        status: "ok".to_string(),
        service: "FEATS Analysis API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        storage: storage.to_string(),
        inference: inference.to_string(),
    })
}

/// 数据库健康检查
#[utoipa::path(
    get,
    path = "/api/health/db",
    tag = "system",
    responses(
        (status = 200, description = "数据库正常"),
        (status = 503, description = "数据库不可用", body = crate::response::ErrorResponse),
    )
)]
pub async fn database_health(State(state): State<AppState>) -> Result<Json<JsonValue>, AppError> {
    let db = state
        .database
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("数据库未配置"))?;

    match db.health_check().await {
        Ok(true) => Ok(Json(json!({"status": "healthy"}))),
        _ => Err(AppError::service_unavailable("数据库健康检查失败")),
    }
}

/// 图像托管健康检查
#[utoipa::path(
    get,
    path = "/api/health/storage",
    tag = "system",
    responses(
        (status = 200, description = "托管服务正常"),
        (status = 503, description = "托管服务不可用", body = crate::response::ErrorResponse),
    )
)]
pub async fn storage_health(State(state): State<AppState>) -> Result<Json<JsonValue>, AppError> {
    let store = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("图像托管服务未配置"))?;

    match store.health_check().await {
        Ok(true) => Ok(Json(json!({"status": "healthy"}))),
        _ => Err(AppError::service_unavailable("图像托管健康检查失败")),
    }
}
