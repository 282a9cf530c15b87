//! 翻译后端接口
//!
//! 编排逻辑只依赖 [`TranslationBackend`]，真实实现见 [`client::HttpBackend`]。

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use crate::model::data_core::AppError;
use types::{ConfigRequest, ConfigResponse, TranslationRequest, TranslationResponse};

pub trait TranslationBackend {
    /// `POST /config`
    fn set_config(&self, request: &ConfigRequest) -> Result<ConfigResponse, AppError>;
    /// `POST /translate`（multipart）
    fn translate_image(&self, request: &TranslationRequest) -> Result<TranslationResponse, AppError>;
    /// `GET /download/{filename}`
    fn download_result(&self, filename: &str) -> Result<Vec<u8>, AppError>;
    /// 读取 `output_url` 指向的图片，用于结果显示
    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, AppError>;
}
