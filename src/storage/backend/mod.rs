//! SeaORM storage backend
//!
//! Owns the connection pool for SQLite, MySQL/MariaDB or PostgreSQL, runs
//! migrations on startup and keeps a short-lived cache of pagination counts.

mod connection;
pub mod retry;

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use sea_orm::{DatabaseBackend, DatabaseConnection};
use tracing::{info, warn};

use crate::errors::{Result, TravelbookError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(TravelbookError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    match backend.to_lowercase().as_str() {
        "mariadb" => "mysql".to_string(),
        "postgresql" | "pg" => "postgres".to_string(),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 分页 COUNT 缓存（TTL 30秒）
    count_cache: Cache<String, u64>,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(TravelbookError::database_config("database_url 未设置"));
        }

        let backend_name = normalize_backend_name(backend_name);
        let retry_config = retry::RetryConfig::from_config(&crate::config::get_config());

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, &backend_name).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name,
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(1000)
                .build(),
            retry_config,
        };

        run_migrations(&storage.db).await?;

        info!(
            "{} storage initialized",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// `sqlite` / `mysql` / `postgres`
    pub fn get_backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn db_backend(&self) -> DatabaseBackend {
        self.db.get_database_backend()
    }

    pub fn retry_config(&self) -> retry::RetryConfig {
        self.retry_config
    }

    /// 读取或计算分页 COUNT
    ///
    /// key 必须包含会影响结果的全部参数（用户、筛选条件等）。
    pub async fn cached_count<F, Fut>(&self, key: String, compute: F) -> Result<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64>>,
    {
        if let Some(count) = self.count_cache.get(&key).await {
            return Ok(count);
        }
        let count = compute().await?;
        self.count_cache.insert(key, count).await;
        Ok(count)
    }

    /// 清除分页 COUNT 缓存（数据变更时调用）
    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }

    /// 健康检查
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| TravelbookError::database_connection(format!("数据库不可用: {}", e)))
    }

    /// 关闭连接池
    pub async fn close(&self) {
        if let Err(e) = self.db.clone().close().await {
            warn!("Failed to close database pool: {}", e);
        }
    }
}
