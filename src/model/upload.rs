//! 图片选择与预览：校验用户选择的文件，生成本地预览，清除时释放预览资源

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::utils::validators::{accepted_extensions_display, validate_image_file};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("不支持的文件格式（{0}）。请使用 {exts}", exts = accepted_extensions_display())]
    UnsupportedType(String),
    #[error("文件太大（{0} 字节）。最大支持 10MB")]
    TooLarge(u64),
    #[error("读取图片失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 用户选择的图片文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    /// 来源路径；内存构造的文件为 None
    pub source: Option<PathBuf>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
            source: None,
        }
    }

    /// 从磁盘读取文件，MIME类型按扩展名推断
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(Self {
            name,
            mime,
            bytes,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn extension(&self) -> &str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// 本地预览：图片内容的临时副本，drop 时删除
#[derive(Debug)]
pub struct Preview {
    file: NamedTempFile,
}

impl Preview {
    fn create(image: &ImageFile) -> Result<Self, UploadError> {
        let mut file = tempfile::Builder::new()
            .prefix("manga-preview-")
            .suffix(&format!(".{}", image.extension()))
            .tempfile()?;
        file.write_all(&image.bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// 供显示使用的 `file://` 地址
    pub fn uri(&self) -> String {
        format!("file://{}", self.file.path().display())
    }

    /// 释放预览资源（删除临时文件）
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!("释放预览失败 {}: {}", path.display(), e);
        }
    }
}

#[derive(Debug)]
pub struct UploadedImage {
    pub file: ImageFile,
    pub preview: Preview,
    pub id: String,
}

#[derive(Debug, Default)]
pub struct ImageUploader {
    image: Option<UploadedImage>,
}

impl ImageUploader {
    /// 校验并载入图片；失败时保持原状态不变
    pub fn upload_image(&mut self, file: ImageFile) -> Result<&UploadedImage, UploadError> {
        validate_image_file(&file.mime, file.size())?;

        let preview = Preview::create(&file)?;
        let id = format!("{}-{}", chrono::Utc::now().timestamp_millis(), file.name);
        tracing::info!("图片已载入: {} ({} 字节, {})", file.name, file.size(), file.mime);

        if let Some(old) = self.image.take() {
            old.preview.release();
        }
        Ok(self.image.insert(UploadedImage { file, preview, id }))
    }

    pub fn clear_image(&mut self) {
        if let Some(old) = self.image.take() {
            tracing::info!("清除图片: {}", old.file.name);
            old.preview.release();
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validators::MAX_FILE_SIZE;

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G', 1, 2, 3])
    }

    #[test]
    fn test_valid_image_builds_preview() {
        let mut uploader = ImageUploader::default();
        let uploaded = uploader.upload_image(png("page_001.png")).expect("有效图片应该载入成功");

        let uri = uploaded.preview.uri();
        assert!(!uri.is_empty(), "预览地址不应为空");
        assert!(uploaded.preview.path().exists(), "预览文件应该存在");
        assert!(uploaded.id.ends_with("-page_001.png"));
        assert_eq!(fs::read(uploaded.preview.path()).unwrap(), png("x").bytes);
    }

    #[test]
    fn test_preview_distinct_from_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("page.webp");
        fs::write(&source, b"RIFFxxxxWEBP").unwrap();

        let file = ImageFile::from_path(&source).expect("读取文件应该成功");
        assert_eq!(file.mime, "image/webp", "MIME应按扩展名推断");

        let mut uploader = ImageUploader::default();
        let uploaded = uploader.upload_image(file).unwrap();
        assert_ne!(uploaded.preview.path(), source.as_path(), "预览不应指向源文件");
        assert!(!uploaded.preview.uri().contains("page.webp"));
    }

    #[test]
    fn test_invalid_type_keeps_previous_image() {
        let mut uploader = ImageUploader::default();
        uploader.upload_image(png("keep.png")).unwrap();
        let keep_id = uploader.image().unwrap().id.clone();

        let result = uploader.upload_image(ImageFile::new("anim.gif", "image/gif", vec![1]));
        assert!(matches!(result, Err(UploadError::UnsupportedType(_))));
        assert_eq!(uploader.image().unwrap().id, keep_id, "失败时应保留原图片");
    }

    #[test]
    fn test_oversized_file_keeps_previous_image() {
        let mut uploader = ImageUploader::default();
        uploader.upload_image(png("keep.png")).unwrap();
        let keep_preview = uploader.image().unwrap().preview.path().to_path_buf();

        let big = ImageFile::new("big.jpg", "image/jpeg", vec![0; MAX_FILE_SIZE as usize + 1]);
        let result = uploader.upload_image(big);
        assert!(matches!(result, Err(UploadError::TooLarge(_))));
        assert_eq!(uploader.image().unwrap().file.name, "keep.png");
        assert!(keep_preview.exists(), "原预览不应被释放");
    }

    #[test]
    fn test_rejected_upload_on_empty_stays_empty() {
        let mut uploader = ImageUploader::default();
        let result = uploader.upload_image(ImageFile::new("a.pdf", "application/pdf", vec![1]));
        assert!(result.is_err());
        assert!(!uploader.has_image());
    }

    #[test]
    fn test_replace_releases_old_preview() {
        let mut uploader = ImageUploader::default();
        uploader.upload_image(png("first.png")).unwrap();
        let old_preview = uploader.image().unwrap().preview.path().to_path_buf();

        uploader.upload_image(png("second.png")).unwrap();
        assert!(!old_preview.exists(), "替换图片时应释放旧预览");
        assert_eq!(uploader.image().unwrap().file.name, "second.png");
    }

    #[test]
    fn test_clear_image_releases_preview() {
        let mut uploader = ImageUploader::default();
        uploader.upload_image(png("page.png")).unwrap();
        let preview = uploader.image().unwrap().preview.path().to_path_buf();

        uploader.clear_image();
        assert!(!uploader.has_image());
        assert!(!preview.exists(), "清除后预览文件应被删除");

        uploader.clear_image();
        assert!(!uploader.has_image(), "重复清除应无副作用");
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = ImageFile::from_path(Path::new("/nonexistent/definitely/missing.png"));
        assert!(matches!(result, Err(UploadError::Io(_))));
    }
}
