use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一错误响应体
///
/// 管线端点约定的错误格式：`{ "error": "..." }`。
/// 状态码由 `AppError::into_response` 决定，这里只承载消息本身。
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// 面向调用方的错误描述
    pub error: String,
}

impl ErrorResponse {
    pub fn new<T: Into<String>>(error: T) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
