//! IO helper: JSON 文件读写与二进制保存

use std::{fs::{self, File}, io::{BufReader, BufWriter, Write}, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::model::data_core::AppError;

/// 从文件读取并反序列化JSON
pub fn read_json_file<T: DeserializeOwned>(p: &Path) -> Result<T, AppError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    Ok(serde_json::from_reader(rdr)?)
}

/// 将数据保存为JSON文件（格式化输出），父目录不存在时自动创建
pub fn write_json_file<T: Serialize>(p: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = p.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut w = BufWriter::new(File::create(p)?);
    serde_json::to_writer_pretty(&mut w, value)?;
    w.flush()?;
    Ok(())
}

/// 将下载得到的二进制内容写入目标文件
pub fn write_bytes(p: &Path, bytes: &[u8]) -> Result<(), AppError> {
    fs::write(p, bytes)?;
    Ok(())
}
