use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// 评分上限（含）
pub const RATING_MAX: i16 = 5;

/// 单项评估量表结果
///
/// `rating` 的规范表示是 [0,5] 区间的整数；`"4/5"` 这类分数字符串
/// 只是展示层/线格式的细节，进入业务逻辑前必须在边界处转换一次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    /// 量表标题，在一次结果集内唯一，与目录保持稳定
    pub title: String,
    /// 量表含义的静态说明（来自目录，不由推理服务生成）
    pub description: String,
    /// 整数评分，范围 [0,5]
    pub rating: i16,
    /// 本次分析的评分理由（逐次生成）
    pub explanation: String,
    /// 量表图标地址（来自目录）
    pub image_url: String,
}

/// 将推理服务返回的评分值转换为规范的整数表示
///
/// 接受整数、整数字符串（"4"）和分数字符串（"4/5"）三种形式；
/// 超出 [0,5] 的值直接拒绝为 `InferenceOutOfRange`，不做静默截断，
/// 由调用方决定处理策略。
pub fn parse_rating(title: &str, raw: &JsonValue) -> AppResult<i16> {
    let out_of_range = |value: String| AppError::InferenceOutOfRange {
        title: title.to_string(),
        value,
    };

    let rating = match raw {
        JsonValue::Number(n) => n.as_i64().ok_or_else(|| {
            AppError::inference_malformed(format!("量表 {} 的评分不是整数: {}", title, n))
        })?,
        JsonValue::String(s) => {
            // "4/5" 形式只取分子，分母（若存在）必须为5
            let (numerator, denominator) = match s.split_once('/') {
                Some((num, den)) => (num.trim(), Some(den.trim())),
                None => (s.trim(), None),
            };
            if let Some(den) = denominator {
                if den != "5" {
                    return Err(AppError::inference_malformed(format!(
                        "量表 {} 的评分分母不是5: {}",
                        title, s
                    )));
                }
            }
            numerator.parse::<i64>().map_err(|_| {
                AppError::inference_malformed(format!("量表 {} 的评分无法解析: {}", title, s))
            })?
        }
        other => {
            return Err(AppError::inference_malformed(format!(
                "量表 {} 的评分类型无效: {}",
                title, other
            )));
        }
    };

    if !(0..=RATING_MAX as i64).contains(&rating) {
        return Err(out_of_range(rating.to_string()));
    }

    Ok(rating as i16)
}
