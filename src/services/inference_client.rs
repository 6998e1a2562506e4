use reqwest::Client;
use serde_json::{Value as JsonValue, json};
use std::time::Instant;
use tracing::{debug, error};

use crate::{
    catalog,
    config::InferenceConfig,
    error::{AppError, AppResult},
    models::{Scale, scale::parse_rating},
};

/// 推理输入
///
/// 正常路径提交托管后的图像URL；托管降级时编排器会尝试提交
/// 原始字节，前提是网关声明支持。
#[derive(Debug, Clone)]
pub enum ImageSource {
    Url(String),
    Bytes { data: Vec<u8>, content_type: String },
}

/// 一次成功推理的产出
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// 每个目录量表恰好一项，保持目录顺序
    pub scales: Vec<Scale>,
    pub model_version: String,
    /// 推理耗时（秒）
    pub processing_time: f64,
}

/// 推理服务抽象接口
#[async_trait::async_trait]
pub trait InferenceGateway {
    /// 是否支持直接提交原始图像字节（而非托管URL）
    fn supports_raw_bytes(&self) -> bool {
        false
    }

    /// 提交图像并获取逐项评分
    async fn infer(&self, source: &ImageSource) -> AppResult<InferenceOutcome>;
}

/// Groq推理客户端（OpenAI兼容的chat-completions协议）
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: Client,
    config: InferenceConfig,
}

impl GroqClient {
    pub fn new(config: InferenceConfig) -> AppResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| AppError::config(format!("创建HTTP客户端失败: {}", e)))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

#[async_trait::async_trait]
impl InferenceGateway for GroqClient {
    // 线上部署拒绝超大的data URL载荷，模型只接受托管后的图像地址
    fn supports_raw_bytes(&self) -> bool {
        false
    }

    async fn infer(&self, source: &ImageSource) -> AppResult<InferenceOutcome> {
        let image_url = match source {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Bytes { .. } => {
                return Err(AppError::inference_unavailable(
                    "推理服务需要可访问的图像URL",
                ));
            }
        };

        let catalog = catalog::default_scales();
        let body = json!({
            "model": self.config.model,
            "temperature": 0,
            "response_format": {"type": "json_object"},
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert art therapist analyzing images using the FEATS criteria."
                },
                {
                    "role": "user",
                    "content": [
                        {"type": "text", "text": build_feats_prompt(&catalog)},
                        {"type": "image_url", "image_url": {"url": image_url}}
                    ]
                }
            ]
        });

        let started = Instant::now();
        let resp = self
            .http
            .post(self.url("/chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::inference_unavailable(format!("推理请求失败: {}", e)))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        debug!(len = text.len(), "推理响应长度");

        if !status.is_success() {
            let preview = text.chars().take(200).collect::<String>();
            return Err(AppError::inference_unavailable(format!(
                "推理服务返回错误: status={}, body_preview={}",
                status, preview
            )));
        }

        let json: JsonValue = serde_json::from_str(&text).map_err(|e| {
            error!(payload = %text, "推理响应不是合法JSON: {}", e);
            AppError::inference_malformed(format!("推理响应不是合法JSON: {}", e))
        })?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                // 可信后端的契约错误，记录完整载荷便于诊断
                error!(payload = %text, "推理响应缺少消息内容");
                AppError::inference_malformed("推理响应缺少消息内容")
            })?;

        let scales = parse_model_reply(content, &catalog).inspect_err(|_| {
            error!(payload = %content, "模型回复解析失败");
        })?;

        let model_version = json["model"]
            .as_str()
            .unwrap_or(&self.config.model)
            .to_string();

        Ok(InferenceOutcome {
            scales,
            model_version,
            processing_time: started.elapsed().as_secs_f64(),
        })
    }
}

/// 构造FEATS分析提示词
///
/// 列出全部目录量表，要求模型按固定的JSON结构逐项给出
/// 0-5 的评分和理由。
fn build_feats_prompt(catalog: &[Scale]) -> String {
    let mut prompt = String::from(
        "Please analyze this image using the FEATS (Formal Elements Art Therapy Scale) criteria:\n\n",
    );
    for (i, scale) in catalog.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {} (0-5): {}\n",
            i + 1,
            scale.title,
            scale.description
        ));
    }
    prompt.push_str(
        "\nRespond with a JSON object of the form \
         {\"scales\": [{\"title\": \"...\", \"rating\": \"N/5\", \"explanation\": \"...\"}]} \
         containing exactly one entry per criterion, using the exact titles above.",
    );
    prompt
}

/// 在边界处解析模型回复
///
/// 每个目录量表必须恰好对应一项，缺失、重复或未知标题都按
/// 格式错误拒绝，不做静默补齐；评分在这里一次性转换为规范的
/// 整数表示。`description` 和 `image_url` 始终取自目录。
pub fn parse_model_reply(content: &str, catalog: &[Scale]) -> AppResult<Vec<Scale>> {
    let stripped = strip_code_fences(content);
    let reply: JsonValue = serde_json::from_str(stripped)
        .map_err(|e| AppError::inference_malformed(format!("模型回复不是合法JSON: {}", e)))?;

    let entries = reply["scales"]
        .as_array()
        .ok_or_else(|| AppError::inference_malformed("模型回复缺少scales数组"))?;

    let mut by_title = std::collections::HashMap::new();
    for entry in entries {
        let title = entry["title"]
            .as_str()
            .ok_or_else(|| AppError::inference_malformed("量表条目缺少title字段"))?;

        if !catalog.iter().any(|s| s.title == title) {
            return Err(AppError::inference_malformed(format!(
                "模型返回了未知量表: {}",
                title
            )));
        }
        if by_title.contains_key(title) {
            return Err(AppError::inference_malformed(format!(
                "模型重复返回量表: {}",
                title
            )));
        }

        let rating = parse_rating(title, &entry["rating"])?;
        let explanation = entry["explanation"]
            .as_str()
            .ok_or_else(|| {
                AppError::inference_malformed(format!("量表 {} 缺少explanation字段", title))
            })?
            .to_string();

        by_title.insert(title.to_string(), (rating, explanation));
    }

    // 按目录顺序装配，缺项即为部分结果，整体拒绝
    catalog
        .iter()
        .map(|template| {
            let (rating, explanation) = by_title.remove(&template.title).ok_or_else(|| {
                AppError::inference_malformed(format!("模型缺少量表: {}", template.title))
            })?;
            Ok(Scale {
                title: template.title.clone(),
                description: template.description.clone(),
                rating,
                explanation,
                image_url: template.image_url.clone(),
            })
        })
        .collect()
}

/// 去掉模型偶尔包裹的markdown代码围栏
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
