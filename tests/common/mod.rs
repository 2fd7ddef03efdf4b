//! Shared setup for integration tests
//!
//! Every test gets its own SQLite file inside a `TempDir`; the returned guard
//! must stay alive for the duration of the test.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde_json::json;
use tempfile::TempDir;

use travelbook::config::{StaticConfig, init_config_from};
use travelbook::services::UserService;
use travelbook::services::geography_service::{GeographyFixture, GeographyService};
use travelbook::services::user_service::{RegisterRequest, UserProfile};
use travelbook::storage::SeaOrmStorage;

static INIT: Once = Once::new();

pub fn init_test_config() {
    INIT.call_once(|| {
        let mut config = StaticConfig::default();
        config.auth.jwt_secret = "travelbook-integration-test-secret-0123456789".to_string();
        config.auth.cookie_secure = false;
        config.ranking.neighbors = 2;
        // 并发写入测试中 SQLite 会返回 BUSY，需要足够的重试次数
        config.database.retry_count = 10;
        config.database.retry_base_delay_ms = 10;
        config.database.retry_max_delay_ms = 200;
        init_config_from(config);
    });
}

pub async fn test_storage(name: &str) -> (TempDir, Arc<SeaOrmStorage>) {
    init_test_config();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join(format!("{}.db", name));
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");
    (temp_dir, Arc::new(storage))
}

/// Two countries, three regions, six cities and two curated collections
pub fn sample_fixture() -> GeographyFixture {
    serde_json::from_value(json!({
        "parts_of_the_world": [{ "id": 1, "name": "Europe" }],
        "locations": [{ "id": 1, "name": "Eastern Europe", "part_of_the_world_id": 1 }],
        "countries": [
            { "id": 1, "name": "Russia", "fullname": "Russian Federation", "code": "RU", "location_id": 1 },
            { "id": 2, "name": "Belarus", "code": "BY", "location_id": 1 }
        ],
        "areas": [{ "id": 1, "title": "Central Federal District", "country_id": 1 }],
        "regions": [
            { "id": 10, "title": "Moscow", "full_name": "Moscow Oblast", "region_type": "oblast",
              "iso3166": "RU-MOS", "country_id": 1, "area_id": 1 },
            { "id": 11, "title": "Tver", "full_name": "Tver Oblast", "region_type": "oblast",
              "iso3166": "RU-TVE", "country_id": 1, "area_id": 1 },
            { "id": 20, "title": "Minsk", "full_name": "Minsk Region", "region_type": "region",
              "country_id": 2 }
        ],
        "cities": [
            { "id": 100, "title": "Podolsk", "country_id": 1, "region_id": 10,
              "population": 300000, "date_of_foundation": 1781, "latitude": 55.43, "longitude": 37.54 },
            { "id": 101, "title": "Kolomna", "country_id": 1, "region_id": 10,
              "population": 140000, "date_of_foundation": 1177, "latitude": 55.10, "longitude": 38.77 },
            { "id": 102, "title": "Tver", "country_id": 1, "region_id": 11,
              "population": 420000, "date_of_foundation": 1135, "latitude": 56.86, "longitude": 35.90 },
            { "id": 103, "title": "Torzhok", "country_id": 1, "region_id": 11,
              "population": 45000, "date_of_foundation": 1139, "latitude": 57.04, "longitude": 34.96 },
            { "id": 104, "title": "Rzhev", "country_id": 1, "region_id": 11,
              "population": 58000, "date_of_foundation": 1216, "latitude": 56.26, "longitude": 34.33 },
            { "id": 200, "title": "Borisov", "country_id": 2, "region_id": 20,
              "population": 140000, "date_of_foundation": 1102, "latitude": 54.23, "longitude": 28.50 }
        ],
        "collections": [
            { "id": 1, "title": "Golden Ring", "city_ids": [101, 102] },
            { "id": 2, "title": "Upper Volga", "city_ids": [102, 103, 104] }
        ]
    }))
    .expect("Invalid fixture")
}

pub async fn seed_geography(storage: &Arc<SeaOrmStorage>) {
    GeographyService::new(storage.clone())
        .import_fixture(sample_fixture())
        .await
        .expect("Failed to import fixture");
}

pub async fn create_user(storage: &Arc<SeaOrmStorage>, username: &str) -> UserProfile {
    UserService::new(storage.clone())
        .register(RegisterRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "correct-horse-battery".to_string(),
        })
        .await
        .expect("Failed to register user")
}
