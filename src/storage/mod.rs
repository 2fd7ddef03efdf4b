use std::sync::Arc;

use crate::errors::Result;

pub mod backend;

pub use backend::{SeaOrmStorage, infer_backend_from_url, normalize_backend_name, retry};

pub struct StorageFactory;

impl StorageFactory {
    /// 按全局配置中的 `database.database_url` 创建存储
    pub async fn create() -> Result<Arc<SeaOrmStorage>> {
        let config = crate::config::get_config();
        let database_url = &config.database.database_url;

        // 从 URL 自动推断数据库类型
        let backend_type = infer_backend_from_url(database_url)?;

        let storage = SeaOrmStorage::new(database_url, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
