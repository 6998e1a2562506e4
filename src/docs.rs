use axum::{Json, response::Html};
use utoipa::OpenApi;

use crate::{
    handlers::{
        analyze::AnalyzeResponse,
        inference::{InferenceRequest, InferenceResponse},
        system::SystemStatus,
        upload::UploadResponse,
    },
    models::{AnalysisResult, AverageRating, ImageRecord, Scale},
    response::ErrorResponse,
};

/// OpenAPI文档定义
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FEATS Analysis API",
        description = "基于FEATS（Formal Elements Art Therapy Scale）量表的图像分析服务"
    ),
    paths(
        crate::handlers::analyze::analyze_image,
        crate::handlers::upload::upload_image,
        crate::handlers::inference::run_inference,
        crate::handlers::history::list_scales,
        crate::handlers::history::get_image,
        crate::handlers::history::get_analysis,
        crate::handlers::history::get_average_ratings,
        crate::handlers::system::health,
        crate::handlers::system::system_status,
        crate::handlers::system::database_health,
        crate::handlers::system::storage_health,
    ),
    components(schemas(
        Scale,
        ImageRecord,
        AnalysisResult,
        AverageRating,
        AnalyzeResponse,
        UploadResponse,
        InferenceRequest,
        InferenceResponse,
        SystemStatus,
        ErrorResponse,
    )),
    tags(
        (name = "analysis", description = "图像分析管线"),
        (name = "catalog", description = "量表目录"),
        (name = "history", description = "历史查询"),
        (name = "system", description = "系统状态"),
    )
)]
pub struct ApiDoc;

/// OpenAPI规范（JSON）
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI页面（CDN加载）
pub async fn swagger_ui() -> Html<&'static str> {
    Html(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <title>FEATS Analysis API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css"/>
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      SwaggerUIBundle({
        url: "/api-docs/openapi.json",
        dom_id: "#swagger-ui",
      });
    };
  </script>
</body>
</html>"##,
    )
}
