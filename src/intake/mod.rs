pub mod validator;

pub use validator::ImageValidator;

use crate::config::FileConfig;
use crate::error::AppResult;
use sha2::{Digest, Sha256};

/// 图像接收配置
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// 最大图像大小（字节）
    pub max_image_size: u64,
    /// 允许的MIME类型，留空表示接受任意 image/* 类型
    pub allowed_mime_types: Vec<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_image_size: 5 * 1024 * 1024, // 5 MiB
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
            ],
        }
    }
}

impl From<&FileConfig> for IntakeConfig {
    fn from(config: &FileConfig) -> Self {
        Self {
            max_image_size: config.max_size,
            allowed_mime_types: config.allowed_mime_types.clone(),
        }
    }
}

/// 身份校验策略
///
/// `/upload` 要求携带身份令牌，`/analyze` 允许匿名提交。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    Required,
    Optional,
}

/// 未经验证的原始上传
#[derive(Debug, Clone)]
pub struct RawUpload {
    /// 图像字节
    pub bytes: Vec<u8>,
    /// 客户端声明的内容类型
    pub declared_type: Option<String>,
    /// 调用方身份令牌
    pub identity: Option<String>,
}

/// 通过验证的图像句柄
///
/// 携带提交的原始字节继续进入管线，本身不做任何网络或存储操作。
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub bytes: Vec<u8>,
    /// 解析后的内容类型（优先使用字节嗅探结果）
    pub content_type: String,
    /// 字节内容的SHA256摘要，用作托管存储键
    pub sha256: String,
    /// 验证通过的调用方身份，匿名提交时为空
    pub user_id: Option<String>,
}

/// 图像接收器
#[derive(Debug, Clone)]
pub struct ImageIntake {
    validator: ImageValidator,
}

impl ImageIntake {
    /// 创建新的图像接收器
    pub fn new(config: IntakeConfig) -> Self {
        Self {
            validator: ImageValidator::new(&config),
        }
    }

    /// 验证原始上传并生成图像句柄
    ///
    /// 规则依次为：身份令牌、数据非空、内容类型、大小上限。
    /// 全部通过才返回句柄，任何一条失败都带有独立的失败原因。
    pub fn validate(&self, raw: RawUpload, policy: IdentityPolicy) -> AppResult<ValidatedImage> {
        let user_id = match policy {
            IdentityPolicy::Required => {
                Some(self.validator.validate_identity(raw.identity.as_deref())?)
            }
            IdentityPolicy::Optional => raw
                .identity
                .filter(|token| !token.trim().is_empty()),
        };

        self.validator.validate_not_empty(&raw.bytes)?;

        let content_type = resolve_content_type(&raw.bytes, raw.declared_type.as_deref());
        self.validator.validate_content_type(&content_type)?;

        self.validator.validate_size(&raw.bytes)?;

        let sha256 = sha256_hex(&raw.bytes);

        Ok(ValidatedImage {
            bytes: raw.bytes,
            content_type,
            sha256,
            user_id,
        })
    }
}

/// 解析内容类型
///
/// 优先按文件头嗅探，嗅探不出图像类型时退回客户端声明的类型。
fn resolve_content_type(data: &[u8], declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(data) {
        let sniffed = kind.mime_type();
        if sniffed.starts_with("image/") {
            return sniffed.to_string();
        }
    }

    declared
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// 计算SHA256摘要（十六进制）
fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
