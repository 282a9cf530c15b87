//! 基于 reqwest 阻塞客户端的后端实现，需在后台线程中调用

use reqwest::blocking::{multipart, Client, Response};

use crate::{
    api::{
        types::{ConfigRequest, ConfigResponse, ErrorBody, TranslationRequest, TranslationResponse},
        TranslationBackend,
    },
    config::AppConfig,
    model::data_core::AppError,
};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: AppConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn download_url(&self, filename: &str) -> Result<reqwest::Url, AppError> {
        let mut url = reqwest::Url::parse(&self.config.endpoint("download"))
            .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidUrl(self.config.api_base_url.clone()))?
            .push(filename);
        Ok(url)
    }
}

/// 非 2xx 响应转为 `AppError::Api`，并尽量提取后端的错误描述
fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or(text);
    tracing::error!("API 错误 {}: {}", status, message);
    Err(AppError::Api { status: status.as_u16(), message })
}

impl TranslationBackend for HttpBackend {
    fn set_config(&self, request: &ConfigRequest) -> Result<ConfigResponse, AppError> {
        let url = self.config.endpoint("config");
        tracing::info!("推送翻译配置: {}", url);
        let response = self.client.post(&url).json(request).send()?;
        Ok(check_status(response)?.json()?)
    }

    fn translate_image(&self, request: &TranslationRequest) -> Result<TranslationResponse, AppError> {
        let url = self.config.endpoint("translate");
        let part = multipart::Part::bytes(request.image.bytes.clone())
            .file_name(request.image.name.clone())
            .mime_str(&request.image.mime)?;
        let mut form = multipart::Form::new().part("file", part);
        if let Some(mapping) = request.name_mapping_field() {
            form = form.text("name_mapping", mapping);
        }
        if let Some(prompt) = request.extra_prompt_field() {
            form = form.text("extra_prompt", prompt.to_string());
        }

        tracing::info!("上传图片翻译: {} -> {}", request.image.name, url);
        let response = self.client.post(&url).multipart(form).send()?;
        Ok(check_status(response)?.json()?)
    }

    fn download_result(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        let url = self.download_url(filename)?;
        tracing::info!("下载翻译结果: {}", url);
        let response = self.client.get(url).send()?;
        Ok(check_status(response)?.bytes()?.to_vec())
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let url = self.config.resolve_url(url);
        let response = self.client.get(&url).send()?;
        Ok(check_status(response)?.bytes()?.to_vec())
    }
}
