use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{
    self, AppState,
};

/// 组装全部API路由
///
/// 只注册POST的端点在收到GET时由路由层返回405。
pub fn create_api_routes(state: AppState) -> Router {
    Router::new()
        // 分析管线
        .route("/analyze", post(handlers::analyze_image))
        .route("/upload", post(handlers::upload_image))
        .route("/inference", post(handlers::run_inference))
        // 只读查询
        .route("/api/scales", get(handlers::list_scales))
        .route("/api/images/{id}", get(handlers::get_image))
        .route("/api/analyses/{image_id}", get(handlers::get_analysis))
        .route("/api/ratings/average", get(handlers::get_average_ratings))
        // 系统
        .route("/health", get(handlers::health))
        .route("/api/status", get(handlers::system_status))
        .route("/api/health/db", get(handlers::database_health))
        .route("/api/health/storage", get(handlers::storage_health))
        // API文档
        .route("/api-docs/openapi.json", get(crate::docs::openapi_json))
        .route("/swagger-ui", get(crate::docs::swagger_ui))
        .with_state(state)
}
