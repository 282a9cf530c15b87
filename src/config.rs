//! 应用配置：从环境变量读取，缺省时使用默认值

use std::{env, path::PathBuf, time::Duration};

pub const ENV_API_BASE_URL: &str = "MANGA_API_BASE_URL";
pub const ENV_APP_NAME: &str = "MANGA_APP_NAME";
pub const ENV_API_TIMEOUT_SECS: &str = "MANGA_API_TIMEOUT_SECS";
pub const ENV_SETTINGS_DIR: &str = "MANGA_SETTINGS_DIR";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_APP_NAME: &str = "漫画翻译器";
/// 图片处理可能较慢，默认 60 秒
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const SETTINGS_SUBDIR: &str = "manga-translator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub app_name: String,
    pub api_base_url: String,
    pub timeout: Duration,
    pub settings_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            settings_dir: default_settings_dir(),
        }
    }
}

impl AppConfig {
    /// 从进程环境变量构建配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 通过任意查找函数构建配置（便于测试，不依赖真实环境）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout = match non_empty(ENV_API_TIMEOUT_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!("无效的超时配置 {}={}，使用默认值", ENV_API_TIMEOUT_SECS, raw);
                    defaults.timeout
                }
            },
            None => defaults.timeout,
        };

        Self {
            app_name: non_empty(ENV_APP_NAME).unwrap_or(defaults.app_name),
            api_base_url: non_empty(ENV_API_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            timeout,
            settings_dir: non_empty(ENV_SETTINGS_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_dir),
        }
    }

    /// 拼接 API 端点地址
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    /// 将后端返回的输出地址解析为绝对 URL
    ///
    /// 后端返回的 `output_url` 可能是绝对地址，也可能是 `/api/outputs/x.png`
    /// 这种以根路径开头的相对地址，此时拼接基础地址的 origin。
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        if url.starts_with('/') {
            return format!("{}{}", origin_of(&self.api_base_url), url);
        }
        self.endpoint(url)
    }
}

fn origin_of(base: &str) -> &str {
    let after_scheme = base.find("://").map(|i| i + 3).unwrap_or(0);
    match base[after_scheme..].find('/') {
        Some(i) => &base[..after_scheme + i],
        None => base,
    }
}

fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SETTINGS_SUBDIR)
}
