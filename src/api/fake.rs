//! 测试用后端：按预设返回结果，并记录每次调用

use std::sync::Mutex;

use crate::{
    api::{
        types::{ConfigRequest, ConfigResponse, TranslationRequest, TranslationResponse},
        TranslationBackend,
    },
    model::data_core::AppError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetConfig(ConfigRequest),
    Translate {
        file_name: String,
        name_mapping: Option<String>,
        extra_prompt: Option<String>,
    },
    Download(String),
    FetchImage(String),
}

pub struct FakeBackend {
    pub config_ok: bool,
    pub config_fails: bool,
    pub translate_response: Option<TranslationResponse>,
    pub download_bytes: Option<Vec<u8>>,
    pub(crate) calls: Mutex<Vec<Call>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            config_ok: true,
            config_fails: false,
            translate_response: None,
            download_bytes: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn succeeding(output_url: &str, filename: Option<&str>) -> Self {
        Self {
            translate_response: Some(TranslationResponse {
                success: true,
                output_url: Some(output_url.to_string()),
                filename: filename.map(String::from),
                error: None,
            }),
            ..Self::default()
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            translate_response: Some(TranslationResponse {
                success: false,
                output_url: None,
                filename: None,
                error: Some(error.to_string()),
            }),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn unavailable() -> AppError {
        AppError::Api { status: 503, message: "服务不可用".into() }
    }
}

impl TranslationBackend for FakeBackend {
    fn set_config(&self, request: &ConfigRequest) -> Result<ConfigResponse, AppError> {
        self.record(Call::SetConfig(request.clone()));
        if self.config_fails {
            return Err(Self::unavailable());
        }
        Ok(ConfigResponse { ok: self.config_ok, message: "配置已成功更新".into() })
    }

    fn translate_image(&self, request: &TranslationRequest) -> Result<TranslationResponse, AppError> {
        self.record(Call::Translate {
            file_name: request.image.name.clone(),
            name_mapping: request.name_mapping_field(),
            extra_prompt: request.extra_prompt_field().map(String::from),
        });
        self.translate_response.clone().ok_or_else(Self::unavailable)
    }

    fn download_result(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        self.record(Call::Download(filename.to_string()));
        self.download_bytes.clone().ok_or_else(Self::unavailable)
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, AppError> {
        self.record(Call::FetchImage(url.to_string()));
        self.download_bytes.clone().ok_or_else(Self::unavailable)
    }
}
