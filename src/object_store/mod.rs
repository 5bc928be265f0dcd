//! 附件对象存储

mod local;

pub use local::LocalObjectStore;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{PlannerError, Result};

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, data: &[u8]) -> Result<()>;
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;
    // 返回对象是否存在
    async fn delete(&self, path: &str) -> Result<bool>;
}

/// 对象路径：`<homework_id>/<unix_millis>-<random>.<ext>`
pub fn attachment_path(homework_id: &str, extension: &str) -> String {
    let random: String = uuid::Uuid::new_v4().simple().to_string()[..12].to_string();
    format!(
        "{homework_id}/{}-{random}.{extension}",
        chrono::Utc::now().timestamp_millis()
    )
}

/// 拒绝绝对路径和 `..`
pub(crate) fn check_path(path: &str) -> Result<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(PlannerError::object_store(format!("非法的对象路径: {path}")));
    }
    Ok(())
}

pub fn create_object_store() -> Arc<dyn ObjectStore> {
    Arc::new(LocalObjectStore::new(&AppConfig::get().upload.dir))
}
