use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response::ErrorResponse;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    // ---- 输入错误（客户端原因，直接返回4xx，不走降级） ----
    #[error("缺少身份令牌")]
    MissingIdentity,

    #[error("缺少图像数据")]
    MissingImage,

    #[error("不支持的图像类型: {content_type}")]
    UnsupportedType { content_type: String },

    #[error("图像过大: 最大允许大小 {max_size} 字节")]
    TooLarge { max_size: u64 },

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    // ---- 依赖错误（基础设施原因，由编排器降级吸收） ----
    #[error("图像托管失败: {0}")]
    Upload(String),

    #[error("推理服务不可用: {0}")]
    InferenceUnavailable(String),

    #[error("推理结果格式错误: {0}")]
    InferenceMalformed(String),

    #[error("推理评分超出范围: {title} = {value}")]
    InferenceOutOfRange { title: String, value: String },

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("服务不可用: {0}")]
    ServiceUnavailable(String),

    #[error("资源不存在: {resource}")]
    NotFound { resource: String },

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// 是否为输入错误（客户端原因）
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingIdentity
                | AppError::MissingImage
                | AppError::UnsupportedType { .. }
                | AppError::TooLarge { .. }
                | AppError::BadRequest(_)
        )
    }

    /// 是否为推理相关的依赖错误
    pub fn is_inference_error(&self) -> bool {
        matches!(
            self,
            AppError::InferenceUnavailable(_)
                | AppError::InferenceMalformed(_)
                | AppError::InferenceOutOfRange { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // 输入错误原样返回给调用方
            AppError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "Missing identity token. Please connect your wallet first.".to_string(),
            ),
            AppError::MissingImage => (StatusCode::BAD_REQUEST, "No image provided".to_string()),
            // 验证失败统一为400，身份缺失除外（401）
            AppError::UnsupportedType { content_type } => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported image type: {}", content_type),
            ),
            AppError::TooLarge { max_size } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Image too large, maximum size is {} MB",
                    max_size / 1024 / 1024
                ),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound { resource } => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", resource))
            }
            AppError::ServiceUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            ),
            // 推理错误只会从 /inference 直连端点到达这里
            e if e.is_inference_error() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to perform inference".to_string(),
            ),
            // 其余一律兜底为通用500，细节只进日志
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing image".to_string(),
            ),
        };

        // 输入错误不算系统故障，只记debug；其余记error并携带完整细节
        if self.is_input_error() {
            tracing::debug!("请求被拒绝: {}", self);
        } else {
            tracing::error!("应用错误: {}", self);
        }

        (status, ErrorResponse::new(message)).into_response()
    }
}

/// 应用程序Result类型别名
pub type AppResult<T> = Result<T, AppError>;

/// 错误构造辅助函数
impl AppError {
    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn unsupported_type<T: Into<String>>(content_type: T) -> Self {
        Self::UnsupportedType {
            content_type: content_type.into(),
        }
    }

    pub fn too_large(max_size: u64) -> Self {
        Self::TooLarge { max_size }
    }

    pub fn upload<T: Into<String>>(msg: T) -> Self {
        Self::Upload(msg.into())
    }

    pub fn inference_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::InferenceUnavailable(msg.into())
    }

    pub fn inference_malformed<T: Into<String>>(msg: T) -> Self {
        Self::InferenceMalformed(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(AppError::MissingIdentity.is_input_error());
        assert!(AppError::MissingImage.is_input_error());
        assert!(AppError::too_large(1024).is_input_error());
        assert!(AppError::unsupported_type("text/plain").is_input_error());
        assert!(!AppError::upload("网络错误").is_input_error());
    }

    #[test]
    fn test_inference_error_classification() {
        assert!(AppError::inference_unavailable("超时").is_inference_error());
        assert!(AppError::inference_malformed("缺少scales字段").is_inference_error());
        assert!(
            AppError::InferenceOutOfRange {
                title: "Color Fit".to_string(),
                value: "7".to_string(),
            }
            .is_inference_error()
        );
        assert!(!AppError::MissingImage.is_inference_error());
    }

    #[test]
    fn test_validation_error_statuses() {
        // 验证失败只产生400/401：身份缺失401，其余一律400
        assert_eq!(
            AppError::MissingIdentity.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::MissingImage.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unsupported_type("text/plain")
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::too_large(1024).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::bad_request("missing field").into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_dependency_error_statuses() {
        assert_eq!(
            AppError::not_found("image x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::service_unavailable("数据库未配置")
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::inference_unavailable("超时")
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::upload("托管失败").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_last_resort_error_body() {
        // 未分类的依赖错误兜底为通用500，细节不外泄
        let response = AppError::storage("数据库不可达").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Error processing image");
    }

    #[tokio::test]
    async fn test_inference_error_body() {
        let response = AppError::inference_malformed("缺少scales数组").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Failed to perform inference");
    }

    #[test]
    fn test_error_display() {
        let err = AppError::too_large(5 * 1024 * 1024);
        assert_eq!(err.to_string(), "图像过大: 最大允许大小 5242880 字节");

        let err = AppError::unsupported_type("application/pdf");
        assert_eq!(err.to_string(), "不支持的图像类型: application/pdf");
    }
}
