use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use super::{ObjectStore, check_path};
use crate::errors::{PlannerError, Result};

/// 本地目录中的对象存储
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        check_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PlannerError::object_store(format!("创建目录失败: {e}")))?;
        }
        fs::write(&full, data)
            .await
            .map_err(|e| PlannerError::object_store(format!("写入对象失败: {e}")))?;
        debug!("Stored object {} ({} bytes)", path, data.len());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.full_path(path)?;
        match fs::read(&full).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PlannerError::object_store(format!("读取对象失败: {e}"))),
        }
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let full = self.full_path(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PlannerError::object_store(format!("删除对象失败: {e}"))),
        }
    }
}
