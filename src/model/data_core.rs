//! AppState：单一会话对象，持有设置、当前图片、翻译结果与通知队列

use std::path::Path;

use thiserror::Error;

use crate::{
    api::TranslationBackend,
    config::AppConfig,
    model::{
        settings::SettingsStore,
        toast::ToastQueue,
        translation::{run_translation, save_download, TranslationJob, TranslationResult},
        upload::{ImageFile, ImageUploader, UploadError, UploadedImage},
    },
    utils::storage::{FileStorage, SettingsStorage},
};

pub const MSG_MISSING_API_KEY: &str = "请先在设置页面输入 Gemini API Key";
pub const MSG_NO_IMAGE: &str = "请先选择要翻译的图片";
pub const MSG_ALREADY_TRANSLATING: &str = "翻译进行中，请稍候";
pub const MSG_IMAGE_LOADED: &str = "图片已载入";
pub const MSG_TRANSLATE_DONE: &str = "翻译完成！";
pub const MSG_TRANSLATE_ERROR_PREFIX: &str = "翻译过程中发生错误: ";
pub const MSG_NO_RESULT: &str = "没有可下载的结果";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("网络请求失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("服务器返回错误 ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("无效的地址: {0}")]
    InvalidUrl(String),
    #[error("{0}")]
    Upload(#[from] UploadError),
    /// 后端明确返回失败，内容即后端给出的错误文本
    #[error("{0}")]
    Translation(String),
    #[error("状态错误: {0}")]
    State(String),
}

/// 上传→翻译流程的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Empty,
    ImageSelected,
    Translating,
    Result,
}

#[derive(Debug)]
pub struct AppState {
    pub settings: SettingsStore,
    pub toasts: ToastQueue,
    uploader: ImageUploader,
    result: Option<TranslationResult>,
    translating: bool,
}

impl AppState {
    /// 按配置中的目录加载持久化设置
    pub fn load(config: &AppConfig) -> Self {
        let storage = FileStorage::new(&config.settings_dir);
        tracing::info!("设置目录: {}", storage.dir().display());
        Self::with_storage(Box::new(storage))
    }

    pub fn with_storage(storage: Box<dyn SettingsStorage>) -> Self {
        Self {
            settings: SettingsStore::load(storage),
            toasts: ToastQueue::default(),
            uploader: ImageUploader::default(),
            result: None,
            translating: false,
        }
    }

    pub fn flow_state(&self) -> FlowState {
        if self.translating {
            FlowState::Translating
        } else if self.result.is_some() {
            FlowState::Result
        } else if self.uploader.has_image() {
            FlowState::ImageSelected
        } else {
            FlowState::Empty
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.uploader.image()
    }

    pub fn result(&self) -> Option<&TranslationResult> {
        self.result.as_ref()
    }

    pub fn is_translating(&self) -> bool {
        self.translating
    }

    /// `result` 是否仍是当前显示的结果（异步加载结果图片完成时用来丢弃过期数据）
    pub fn is_current_result(&self, result: &TranslationResult) -> bool {
        self.result.as_ref() == Some(result)
    }

    /// 选择新图片；成功时清除旧结果，失败时保持原状态
    pub fn upload_image(&mut self, file: ImageFile) -> Result<(), AppError> {
        self.ensure_idle()?;
        match self.uploader.upload_image(file) {
            Ok(_) => {
                self.result = None;
                self.toasts.success(MSG_IMAGE_LOADED);
                Ok(())
            }
            Err(e) => {
                self.toasts.error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// 从磁盘读取并选择图片
    pub fn upload_path(&mut self, path: &Path) -> Result<(), AppError> {
        match ImageFile::from_path(path) {
            Ok(file) => self.upload_image(file),
            Err(e) => {
                self.toasts.error(format!("图片载入失败: {e}"));
                Err(e.into())
            }
        }
    }

    /// 清除图片与结果；翻译进行中时拒绝，避免结果回来时对应的图片已不存在
    pub fn clear_image(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.uploader.clear_image();
        self.result = None;
        Ok(())
    }

    pub fn clear_result(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.result = None;
        Ok(())
    }

    fn ensure_idle(&mut self) -> Result<(), AppError> {
        if self.translating {
            self.toasts.warning(MSG_ALREADY_TRANSLATING);
            return Err(AppError::State(MSG_ALREADY_TRANSLATING.into()));
        }
        Ok(())
    }

    /// 检查前置条件并进入翻译中状态，返回可移交后台执行的任务
    pub fn begin_translation(&mut self) -> Result<TranslationJob, AppError> {
        if !self.settings.has_api_key() {
            self.toasts.error(MSG_MISSING_API_KEY);
            return Err(AppError::State(MSG_MISSING_API_KEY.into()));
        }
        self.ensure_idle()?;
        let Some(image) = self.uploader.image() else {
            self.toasts.error(MSG_NO_IMAGE);
            return Err(AppError::State(MSG_NO_IMAGE.into()));
        };

        let job = TranslationJob {
            api_key: self.settings.api_key().to_string(),
            name_mapping: self.settings.name_mapping().clone(),
            global_prompt: self.settings.global_prompt().to_string(),
            image: image.file.clone(),
        };
        self.translating = true;
        self.result = None;
        tracing::info!("开始翻译: {}", job.image.name);
        Ok(job)
    }

    /// 应用翻译结果并离开翻译中状态
    pub fn finish_translation(&mut self, outcome: Result<TranslationResult, AppError>) {
        self.translating = false;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.toasts.success(MSG_TRANSLATE_DONE);
            }
            Err(AppError::Translation(message)) => {
                self.result = None;
                self.toasts.error(message);
            }
            Err(e) => {
                self.result = None;
                self.toasts.error(format!("{MSG_TRANSLATE_ERROR_PREFIX}{e}"));
            }
        }
    }

    /// 同步执行完整翻译流程（无UI时使用）
    pub fn translate<B>(&mut self, backend: &B) -> Result<(), AppError>
    where
        B: TranslationBackend + ?Sized,
    {
        let job = self.begin_translation()?;
        let outcome = run_translation(backend, job);
        let failed = outcome.as_ref().err().map(ToString::to_string);
        self.finish_translation(outcome);
        match failed {
            Some(message) => Err(AppError::Translation(message)),
            None => Ok(()),
        }
    }

    /// 下载指定结果文件并保存到 `dest`
    pub fn download_result<B>(&mut self, backend: &B, filename: &str, dest: &Path) -> Result<(), AppError>
    where
        B: TranslationBackend + ?Sized,
    {
        let outcome = save_download(backend, filename, dest);
        self.report_download(filename, outcome)
    }

    /// 记录下载结果的通知（后台下载完成后在UI线程调用）
    pub fn report_download(&mut self, filename: &str, outcome: Result<usize, AppError>) -> Result<(), AppError> {
        match outcome {
            Ok(_) => {
                self.toasts.success(format!("已下载 {filename}"));
                Ok(())
            }
            Err(e) => {
                self.toasts.error(format!("下载失败: {e}"));
                Err(e)
            }
        }
    }

    /// 下载当前结果
    pub fn download_current<B>(&mut self, backend: &B, dest: &Path) -> Result<(), AppError>
    where
        B: TranslationBackend + ?Sized,
    {
        let Some(filename) = self.result.as_ref().map(|r| r.filename.clone()) else {
            self.toasts.error(MSG_NO_RESULT);
            return Err(AppError::State(MSG_NO_RESULT.into()));
        };
        self.download_result(backend, &filename, dest)
    }
}
