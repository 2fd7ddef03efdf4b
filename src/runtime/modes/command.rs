//! One-shot maintenance commands

use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

use crate::config::{DEFAULT_CONFIG_PATH, StaticConfig};
use crate::services::GeographyService;
use crate::storage::StorageFactory;

/// 连接数据库并执行全部迁移
pub async fn run_migrate() -> Result<()> {
    let storage = StorageFactory::create()
        .await
        .context("Failed to run migrations")?;
    info!("Database is up to date ({})", storage.get_backend_name());
    storage.close().await;
    Ok(())
}

/// 导入地理数据（JSON fixture），已有记录按 id 更新
pub async fn run_import_geo(file: &Path) -> Result<()> {
    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    let geography = GeographyService::new(storage.clone());

    let summary = geography
        .import_fixture_file(file)
        .await
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!(
        "Imported {} parts of the world, {} locations, {} countries, {} areas, \
         {} regions, {} cities, {} collections",
        summary.parts_of_the_world,
        summary.locations,
        summary.countries,
        summary.areas,
        summary.regions,
        summary.cities,
        summary.collections
    );
    storage.close().await;
    Ok(())
}

/// 生成示例配置文件，路径为 `-` 时输出到 stdout
pub fn run_generate_config(path: Option<&str>, force: bool) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    if path == "-" {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }
    if Path::new(path).exists() && !force {
        bail!("{} already exists, use --force to overwrite", path);
    }

    StaticConfig::default()
        .save_to_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
    println!("Sample configuration written to {}", path);
    Ok(())
}
