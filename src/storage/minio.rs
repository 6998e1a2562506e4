use super::ImageHost;
use crate::{
    config::MinioConfig,
    error::{AppError, AppResult},
};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    config::Credentials,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use std::sync::Arc;

/// MinIO图像托管实现
#[derive(Debug, Clone)]
pub struct MinioImageStore {
    client: Arc<Client>,
    config: MinioConfig,
}

impl MinioImageStore {
    /// 创建新的MinIO托管实例
    pub async fn new(config: MinioConfig) -> AppResult<Self> {
        // 创建自定义凭证
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,    // session token
            None,    // expiration
            "minio", // provider name
        );

        // 构建S3配置
        let s3_config = aws_sdk_s3::Config::builder()
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .region(Region::new("us-east-1")) // MinIO默认区域
            .force_path_style(true) // MinIO需要路径样式
            .behavior_version(BehaviorVersion::latest())
            .build();

        let client = Client::from_conf(s3_config);

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// 确保bucket存在
    pub async fn ensure_bucket(&self, bucket: &str) -> AppResult<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                tracing::debug!("Bucket '{}' 已存在", bucket);
                Ok(())
            }
            Err(_) => {
                tracing::info!("Bucket '{}' 不存在，正在创建", bucket);
                self.create_bucket(bucket).await
            }
        }
    }

    /// 创建bucket
    async fn create_bucket(&self, bucket: &str) -> AppResult<()> {
        let create_bucket_config = CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::UsEast2)
            .build();

        self.client
            .create_bucket()
            .bucket(bucket)
            .create_bucket_configuration(create_bucket_config)
            .send()
            .await
            .map_err(|e| AppError::upload(format!("创建bucket失败: {}", e)))?;

        tracing::info!("成功创建bucket: {}", bucket);
        Ok(())
    }

    /// 生成预签名GET URL作为图像的可访问地址
    async fn presigned_url(&self, key: &str) -> AppResult<String> {
        let presigning_config = aws_sdk_s3::presigning::PresigningConfig::expires_in(
            std::time::Duration::from_secs(self.config.url_expiry_secs),
        )
        .map_err(|e| AppError::upload(format!("预签名配置错误: {}", e)))?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| AppError::upload(format!("生成预签名URL失败: {}", e)))?;

        Ok(presigned_request.uri().to_string())
    }
}

#[async_trait::async_trait]
impl ImageHost for MinioImageStore {
    async fn store_image(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<String> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| AppError::upload(format!("上传图像失败: {}", e)))?;

        let url = self.presigned_url(key).await?;
        tracing::info!(
            "成功托管图像: {}/{} ({} 字节)",
            self.config.bucket,
            key,
            data.len()
        );

        Ok(url)
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self.client.list_buckets().send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::error!("MinIO健康检查失败: {}", e);
                Ok(false)
            }
        }
    }
}
