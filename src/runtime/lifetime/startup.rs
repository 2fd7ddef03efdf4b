use actix_web::web;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::get_config;
use crate::services::{
    CollectionService, GeographyService, PersonalCollectionService, SettingsService,
    StatisticsService, UserService, VisitedCityService, VisitedCountryService,
};
use crate::storage::{SeaOrmStorage, StorageFactory};

/// 服务器运行所需的存储与全部业务服务
#[derive(Clone)]
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub users: Arc<UserService>,
    pub visits: Arc<VisitedCityService>,
    pub geography: Arc<GeographyService>,
    pub countries: Arc<VisitedCountryService>,
    pub settings: Arc<SettingsService>,
    pub collections: Arc<CollectionService>,
    pub personal_collections: Arc<PersonalCollectionService>,
    pub statistics: Arc<StatisticsService>,
}

impl StartupContext {
    /// 基于已有存储构建全部服务
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            users: Arc::new(UserService::new(storage.clone())),
            visits: Arc::new(VisitedCityService::new(storage.clone())),
            geography: Arc::new(GeographyService::new(storage.clone())),
            countries: Arc::new(VisitedCountryService::new(storage.clone())),
            settings: Arc::new(SettingsService::new(storage.clone())),
            collections: Arc::new(CollectionService::new(storage.clone())),
            personal_collections: Arc::new(PersonalCollectionService::new(storage.clone())),
            statistics: Arc::new(StatisticsService::new(storage.clone())),
            storage,
        }
    }

    /// 注册 app_data，服务器与 HTTP 测试共用
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.storage.clone()))
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.visits.clone()))
            .app_data(web::Data::new(self.geography.clone()))
            .app_data(web::Data::new(self.countries.clone()))
            .app_data(web::Data::new(self.settings.clone()))
            .app_data(web::Data::new(self.collections.clone()))
            .app_data(web::Data::new(self.personal_collections.clone()))
            .app_data(web::Data::new(self.statistics.clone()));
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // 重复安装时返回 Err，说明已有 provider，可以忽略
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.get_backend_name());

    check_security_settings();

    let context = StartupContext::new(storage);
    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}

fn check_security_settings() {
    let config = get_config();

    if config.auth.jwt_secret.is_empty() {
        warn!(
            "WARNING: auth.jwt_secret is not set. A random secret is used, \
            all sessions become invalid after restart."
        );
    } else if config.auth.jwt_secret.len() < 32 {
        warn!(
            "WARNING: JWT Secret is too short ({} bytes). \
            Recommended minimum is 32 bytes for security.",
            config.auth.jwt_secret.len()
        );
    }

    if !config.auth.cookie_secure {
        warn!(
            "WARNING: Cookie Secure flag is disabled. \
            Cookies will be sent over unencrypted HTTP connections. \
            Enable cookie_secure=true for production environments."
        );
    }

    if config.auth.allow_registration {
        info!("User registration is open");
    } else {
        info!("User registration is disabled");
    }
}
