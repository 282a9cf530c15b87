//! 设置存储：API Key、人名对照表、全局提示词，每次修改后写回持久化存储

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{model::data_core::AppError, utils::storage::SettingsStorage};

/// 持久化记录使用的固定键
pub const SETTINGS_KEY: &str = "app_settings";
pub const MSG_EMPTY_API_KEY: &str = "请输入 API Key";

pub type NameMapping = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_key: String,
    pub name_mapping: NameMapping,
    pub global_prompt: String,
}

/// 设置页表单数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub api_key: String,
    pub global_prompt: Option<String>,
}

pub struct SettingsStore {
    settings: Settings,
    storage: Box<dyn SettingsStorage>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("has_api_key", &self.has_api_key())
            .field("name_mapping", &self.settings.name_mapping.len())
            .finish()
    }
}

impl SettingsStore {
    /// 从存储中恢复设置；读取或解析失败时静默回退到默认值
    pub fn load(storage: Box<dyn SettingsStorage>) -> Self {
        let settings = match storage.load(SETTINGS_KEY) {
            Ok(Some(raw)) => match serde_json::from_value::<Settings>(raw) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("设置记录损坏，使用默认值: {}", e);
                    Settings::default()
                }
            },
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!("读取设置失败，使用默认值: {}", e);
                Settings::default()
            }
        };
        Self { settings, storage }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn api_key(&self) -> &str {
        &self.settings.api_key
    }

    pub fn name_mapping(&self) -> &NameMapping {
        &self.settings.name_mapping
    }

    pub fn global_prompt(&self) -> &str {
        &self.settings.global_prompt
    }

    pub fn has_api_key(&self) -> bool {
        !self.settings.api_key.is_empty()
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.settings.api_key = api_key.into();
        self.persist();
    }

    pub fn set_global_prompt(&mut self, prompt: impl Into<String>) {
        self.settings.global_prompt = prompt.into();
        self.persist();
    }

    /// 新增或覆盖一条对照
    pub fn add_name_mapping(&mut self, original: impl Into<String>, translation: impl Into<String>) {
        self.settings
            .name_mapping
            .insert(original.into(), translation.into());
        self.persist();
    }

    pub fn remove_name_mapping(&mut self, original: &str) {
        if self.settings.name_mapping.remove(original).is_some() {
            self.persist();
        }
    }

    /// 整表替换
    pub fn update_name_mapping(&mut self, mapping: NameMapping) {
        self.settings.name_mapping = mapping;
        self.persist();
    }

    pub fn clear_settings(&mut self) {
        self.settings = Settings::default();
        self.persist();
    }

    /// 保存设置页表单；提示词缺省时不修改
    ///
    /// 去除空白后 API Key 为空时拒绝保存，原设置保持不变。
    pub fn apply_form(&mut self, form: SettingsForm) -> Result<(), AppError> {
        let api_key = form.api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::State(MSG_EMPTY_API_KEY.to_string()));
        }
        self.settings.api_key = api_key.to_string();
        if let Some(prompt) = form.global_prompt {
            self.settings.global_prompt = prompt;
        }
        self.persist();
        Ok(())
    }

    /// 尽力写回：失败只记录日志，不影响内存状态
    fn persist(&self) {
        let record = match serde_json::to_value(&self.settings) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("序列化设置失败: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.save(SETTINGS_KEY, &record) {
            tracing::warn!("保存设置失败: {}", e);
        }
    }
}

/// 解析“原文=译文”格式的对照文本，一行一条
///
/// 空行与 `#` 开头的注释行会被跳过；只在第一个 `=` 处切分，
/// 原文为空的行被忽略。
pub fn parse_name_mapping_text(text: &str) -> NameMapping {
    let mut mapping = NameMapping::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((original, translation)) = line.split_once('=') else {
            continue;
        };
        let original = original.trim();
        if original.is_empty() {
            continue;
        }
        mapping.insert(original.to_string(), translation.trim().to_string());
    }
    mapping
}

pub fn format_name_mapping_text(mapping: &NameMapping) -> String {
    mapping
        .iter()
        .map(|(original, translation)| format!("{original}={translation}"))
        .collect::<Vec<_>>()
        .join("\n")
}
