use super::IntakeConfig;
use crate::error::{AppError, AppResult};

/// 图像验证器
///
/// 纯检查，不触碰网络与存储。各条规则的失败原因彼此独立，
/// 可直接返回给调用方。
#[derive(Debug, Clone)]
pub struct ImageValidator {
    config: IntakeConfig,
}

impl ImageValidator {
    /// 创建新的图像验证器
    pub fn new(config: &IntakeConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// 验证身份令牌存在且非空
    pub fn validate_identity(&self, identity: Option<&str>) -> AppResult<String> {
        match identity {
            Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
            _ => Err(AppError::MissingIdentity),
        }
    }

    /// 验证图像数据非空
    pub fn validate_not_empty(&self, data: &[u8]) -> AppResult<()> {
        if data.is_empty() {
            return Err(AppError::MissingImage);
        }
        Ok(())
    }

    /// 验证内容类型
    ///
    /// 必须以 `image/` 开头；配置了允许列表时还必须命中列表。
    pub fn validate_content_type(&self, content_type: &str) -> AppResult<()> {
        if !content_type.starts_with("image/") {
            return Err(AppError::unsupported_type(content_type));
        }

        if self.config.allowed_mime_types.is_empty() {
            // 未配置允许列表时接受任意图像类型
            return Ok(());
        }

        if self
            .config
            .allowed_mime_types
            .contains(&content_type.to_string())
        {
            Ok(())
        } else {
            Err(AppError::unsupported_type(content_type))
        }
    }

    /// 验证图像大小
    pub fn validate_size(&self, data: &[u8]) -> AppResult<()> {
        if data.len() as u64 > self.config.max_image_size {
            return Err(AppError::too_large(self.config.max_image_size));
        }
        Ok(())
    }
}
