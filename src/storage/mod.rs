pub mod minio;

pub use minio::MinioImageStore;

use crate::error::AppResult;

/// 图像托管抽象接口
///
/// 每次分析请求最多尝试一次托管，失败不致命：编排器负责决定
/// 降级路径，这里不做自动重试。
#[async_trait::async_trait]
pub trait ImageHost {
    /// 存储图像字节，返回可访问的URL
    async fn store_image(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<String>;

    /// 健康检查
    async fn health_check(&self) -> AppResult<bool>;
}
