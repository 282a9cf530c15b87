//! 漫画图片翻译客户端库
//!
//! 提供设置持久化、图片校验与预览、翻译请求编排和结果下载功能
//! 遵循MVVM架构模式，界面层（Slint）只通过 `AppState` 访问数据

pub mod api;
pub mod config;
pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use api::{client::HttpBackend, TranslationBackend};
pub use config::AppConfig;
pub use model::data_core::{AppError, AppState, FlowState};
pub use model::settings::{Settings, SettingsStore};
pub use model::translation::TranslationResult;
pub use model::upload::{ImageFile, UploadError};
