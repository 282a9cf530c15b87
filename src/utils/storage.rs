//! 持久化存储：以固定键保存一条 JSON 记录
//!
//! 文件实现把每个键写成 `<dir>/<key>.json`；测试用的内存实现
//! 克隆后共享同一份数据，可以模拟“重启后重新加载”。

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use thiserror::Error;

use crate::{
    model::data_core::AppError,
    utils::fs::{read_json_file, write_json_file},
};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("存储IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("存储文件错误: {0}")]
    File(#[from] AppError),
    #[error("存储不可用: {0}")]
    Unavailable(String),
}

/// 键值型持久化存储
pub trait SettingsStorage {
    /// 读取键对应的记录；键不存在时返回 `Ok(None)`
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;
    /// 覆盖写入键对应的记录
    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError>;
}

/// 基于目录的文件存储
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_json_file(&path)?))
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        // 先写临时文件再重命名，避免写到一半留下损坏的记录
        let target = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        write_json_file(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryStorage;

#[cfg(test)]
mod memory {
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
        rc::Rc,
    };

    use serde_json::Value;

    use super::{SettingsStorage, StorageError};

    /// 内存存储
    #[derive(Debug, Clone, Default)]
    pub(crate) struct MemoryStorage {
        entries: Rc<RefCell<HashMap<String, Value>>>,
        fail_writes: Rc<Cell<bool>>,
        writes: Rc<Cell<usize>>,
    }

    impl MemoryStorage {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// 让后续写入全部失败
        pub(crate) fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.set(fail);
        }

        /// 成功写入的次数
        pub(crate) fn write_count(&self) -> usize {
            self.writes.get()
        }

        pub(crate) fn raw(&self, key: &str) -> Option<Value> {
            self.entries.borrow().get(key).cloned()
        }

        pub(crate) fn insert_raw(&self, key: &str, value: Value) {
            self.entries.borrow_mut().insert(key.to_string(), value);
        }
    }

    impl SettingsStorage for MemoryStorage {
        fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Unavailable("写入被禁用".into()));
            }
            self.entries.borrow_mut().insert(key.to_string(), value.clone());
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }
}
