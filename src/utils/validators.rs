//! 图片文件校验：MIME类型与大小

use crate::model::upload::UploadError;

/// 最大文件大小：10MB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const ACCEPTED_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

pub fn is_valid_image_type(mime: &str) -> bool {
    ACCEPTED_TYPES.contains(&mime.trim().to_ascii_lowercase().as_str())
}

pub fn is_valid_file_size(size: u64) -> bool {
    size <= MAX_FILE_SIZE
}

/// 先校验类型再校验大小
pub fn validate_image_file(mime: &str, size: u64) -> Result<(), UploadError> {
    if !is_valid_image_type(mime) {
        return Err(UploadError::UnsupportedType(mime.to_string()));
    }
    if !is_valid_file_size(size) {
        return Err(UploadError::TooLarge(size));
    }
    Ok(())
}

/// 对话框筛选与错误提示用的扩展名列表，例如 `.png, .jpg, .jpeg, .webp`
pub fn accepted_extensions_display() -> String {
    ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}
