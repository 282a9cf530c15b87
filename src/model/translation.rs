//! 翻译编排：先推送配置，再上传图片翻译；以及结果下载

use std::path::Path;

use chrono::{DateTime, Local};

use crate::{
    api::{
        types::{ConfigRequest, TranslationRequest},
        TranslationBackend,
    },
    model::{data_core::AppError, settings::NameMapping, upload::ImageFile},
    utils::fs::write_bytes,
};

pub const MSG_TRANSLATE_FAILED: &str = "翻译失败";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub image_url: String,
    pub filename: String,
    pub timestamp: DateTime<Local>,
}

/// 发起翻译时的设置与图片快照，可移交到后台线程
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub api_key: String,
    pub name_mapping: NameMapping,
    pub global_prompt: String,
    pub image: ImageFile,
}

/// 依次调用 `/config` 与 `/translate`
///
/// 配置推送的传输失败会中止流程；后端返回 `ok: false` 只记录警告并继续，
/// 由 `/translate` 的结果决定成败。
pub fn run_translation<B>(backend: &B, job: TranslationJob) -> Result<TranslationResult, AppError>
where
    B: TranslationBackend + ?Sized,
{
    let config = ConfigRequest {
        api_key: job.api_key,
        name_mapping: Some(job.name_mapping.clone()),
        global_prompt: Some(job.global_prompt.clone()),
    };
    let config_response = backend.set_config(&config)?;
    if !config_response.ok {
        tracing::warn!("后端未接受配置，继续翻译: {}", config_response.message);
    }

    let request = TranslationRequest {
        image: job.image,
        name_mapping: Some(job.name_mapping),
        extra_prompt: Some(job.global_prompt),
    };
    let response = backend.translate_image(&request)?;

    match response.output_url {
        Some(url) if response.success && !url.is_empty() => {
            let filename = response
                .filename
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| filename_from_url(&url));
            tracing::info!("翻译完成: {} ({})", url, filename);
            Ok(TranslationResult {
                image_url: url,
                filename,
                timestamp: Local::now(),
            })
        }
        _ => Err(AppError::Translation(
            response
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| MSG_TRANSLATE_FAILED.to_string()),
        )),
    }
}

/// 取 URL 最后一段作为文件名（去掉查询串与片段）
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(path)
        .to_string()
}

/// 下载结果并保存到本地，返回写入的字节数
pub fn save_download<B>(backend: &B, filename: &str, dest: &Path) -> Result<usize, AppError>
where
    B: TranslationBackend + ?Sized,
{
    let bytes = backend.download_result(filename)?;
    write_bytes(dest, &bytes)?;
    tracing::info!("结果已保存: {} ({} 字节)", dest.display(), bytes.len());
    Ok(bytes.len())
}
