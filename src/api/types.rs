//! 后端接口的请求/响应结构

use serde::{Deserialize, Serialize};

use crate::model::{settings::NameMapping, upload::ImageFile};

/// `POST /config` 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigRequest {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_mapping: Option<NameMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigResponse {
    pub ok: bool,
    #[serde(default)]
    pub message: String,
}

/// `POST /translate` 的 multipart 内容
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub image: ImageFile,
    pub name_mapping: Option<NameMapping>,
    pub extra_prompt: Option<String>,
}

impl TranslationRequest {
    /// 对照表只在非空时作为 JSON 字符串发送
    pub fn name_mapping_field(&self) -> Option<String> {
        self.name_mapping
            .as_ref()
            .filter(|m| !m.is_empty())
            .and_then(|m| serde_json::to_string(m).ok())
    }

    pub fn extra_prompt_field(&self) -> Option<&str> {
        self.extra_prompt.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslationResponse {
    pub success: bool,
    pub output_url: Option<String>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

/// 非 2xx 响应中可能携带的错误信息字段
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        let detail = self.detail.map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        detail.or(self.message).or(self.error)
    }
}
