//! VM桥接层：连接Slint UI与AppState数据模型
//!
//! 注意：回调绑定在main.rs中，因为依赖于Slint生成的类型
//! 这里提供公共常量与不依赖UI的辅助函数

use crate::model::data_core::FlowState;

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_IMAGE_SELECTED: &str = "图片已选择，可以开始翻译";
pub const STATUS_TRANSLATING: &str = "正在翻译，请稍候...";
pub const STATUS_RESULT: &str = "翻译完成";
pub const STATUS_DOWNLOADING: &str = "正在下载...";
pub const STATUS_SETTINGS_SAVED: &str = "设置已保存";
pub const STATUS_SETTINGS_CLEARED: &str = "设置已清空";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

pub const PAGE_TRANSLATE: i32 = 0;
pub const PAGE_SETTINGS: i32 = 1;

/// 流程状态对应的状态栏文本
pub fn status_for(state: FlowState) -> &'static str {
    match state {
        FlowState::Empty => STATUS_READY,
        FlowState::ImageSelected => STATUS_IMAGE_SELECTED,
        FlowState::Translating => STATUS_TRANSLATING,
        FlowState::Result => STATUS_RESULT,
    }
}

/// API Key 的遮罩显示，只保留末尾4位
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
