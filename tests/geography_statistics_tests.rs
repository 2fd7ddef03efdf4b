//! Geography import, region statistics, visited countries, user settings
//! and the personal statistics summary

mod common;

use chrono::{Datelike, NaiveDate, Utc};

use travelbook::errors::TravelbookError;
use travelbook::services::geography_service::FixtureCity;
use travelbook::services::settings_service::{
    CityListSettingForm, DistrictMapColors, ParameterType,
};
use travelbook::services::visited_city_service::VisitForm;
use travelbook::services::{
    GeographyService, SettingsService, StatisticsService, VisitedCityService,
    VisitedCountryService,
};

use common::{create_user, sample_fixture, seed_geography, test_storage};

async fn add_visit(service: &VisitedCityService, user_id: i32, city_id: i32, date: Option<NaiveDate>) {
    service
        .create(
            user_id,
            VisitForm {
                city_id,
                country_id: None,
                region_id: None,
                date_of_visit: date,
                has_magnet: false,
                impression: None,
                rating: 3,
            },
        )
        .await
        .unwrap();
}

// =============================================================================
// Geography
// =============================================================================

#[tokio::test]
async fn test_fixture_import_is_idempotent() {
    let (_dir, storage) = test_storage("geo_import").await;
    let geography = GeographyService::new(storage.clone());

    let summary = geography.import_fixture(sample_fixture()).await.unwrap();
    assert_eq!(summary.countries, 2);
    assert_eq!(summary.regions, 3);
    assert_eq!(summary.cities, 6);
    assert_eq!(summary.collections, 2);

    // 再次导入按 id 更新，不产生重复
    let mut fixture = sample_fixture();
    fixture.cities[0].title = "Podolsk City".to_string();
    geography.import_fixture(fixture).await.unwrap();

    let cities = geography.cities_of_region(10).await.unwrap();
    assert_eq!(cities.len(), 2);
    assert!(cities.iter().any(|c| c.title == "Podolsk City"));
    assert_eq!(geography.list_countries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_fixture_import_from_file() {
    let (dir, storage) = test_storage("geo_import_file").await;
    let path = dir.path().join("geo.json");
    std::fs::write(
        &path,
        r#"{ "countries": [{ "id": 7, "name": "Armenia", "code": "AM" }],
             "cities": [{ "id": 700, "title": "Gyumri", "country_id": 7,
                          "latitude": 40.79, "longitude": 43.85 }] }"#,
    )
    .unwrap();

    let geography = GeographyService::new(storage.clone());
    let summary = geography.import_fixture_file(&path).await.unwrap();
    assert_eq!(summary.countries, 1);
    assert_eq!(summary.cities, 1);
    assert_eq!(geography.cities_of_country(7).await.unwrap()[0].title, "Gyumri");

    let err = geography
        .import_fixture_file(dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::FileOperation(_)));
}

#[tokio::test]
async fn test_region_stats_and_detail() {
    let (_dir, storage) = test_storage("geo_regions").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "rita").await;
    let visits = VisitedCityService::new(storage.clone());
    let geography = GeographyService::new(storage.clone());

    add_visit(&visits, user.id, 100, None).await;
    add_visit(&visits, user.id, 101, None).await;
    add_visit(&visits, user.id, 102, None).await;

    let stats = geography.region_stats(user.id, 1, None, None).await.unwrap();
    assert_eq!(stats.country.code, "RU");
    assert_eq!(stats.total_regions, 2);
    assert_eq!(stats.visited_regions, 2);
    assert_eq!(stats.finished_regions, 1);
    let moscow = stats.regions.iter().find(|r| r.id == 10).unwrap();
    assert_eq!(moscow.ratio, 100);
    let tver = stats.regions.iter().find(|r| r.id == 11).unwrap();
    assert_eq!((tver.visited_cities, tver.total_cities, tver.ratio), (1, 3, 33));

    let finished = geography
        .region_stats(user.id, 1, Some("finished"), Some("name_down"))
        .await
        .unwrap();
    assert_eq!(finished.regions.len(), 1);
    assert_eq!(finished.regions[0].id, 10);

    let detail = geography.region_detail(user.id, 11, None, None).await.unwrap();
    assert_eq!(detail.total_cities, 3);
    assert_eq!(detail.visited_cities, 1);
    assert_eq!(detail.cities.len(), 3);
    assert_eq!(detail.cities[0].title, "Rzhev");
    assert!(detail.cities.iter().any(|c| c.city_id == 102 && c.is_visited));

    let err = geography.region_stats(user.id, 42, None, None).await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));
    let err = geography
        .region_stats(user.id, 1, None, Some("by_mood"))
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::UnknownParameter(_)));
}

/// Tver region plus Staritsa, which has no foundation date
async fn seed_tver_region(storage: &std::sync::Arc<travelbook::storage::SeaOrmStorage>) {
    let mut fixture = sample_fixture();
    fixture.cities.push(FixtureCity {
        id: 105,
        title: "Staritsa".to_string(),
        country_id: 1,
        region_id: Some(11),
        population: Some(18000),
        date_of_foundation: None,
        latitude: 56.51,
        longitude: 34.93,
        wiki: None,
    });
    GeographyService::new(storage.clone())
        .import_fixture(fixture)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_region_detail_sorts_put_missing_values_last() {
    let (_dir, storage) = test_storage("geo_region_sorts").await;
    seed_tver_region(&storage).await;
    let user = create_user(&storage, "sergey").await;
    let visits = VisitedCityService::new(storage.clone());
    let geography = GeographyService::new(storage.clone());

    let form = |city_id, date_of_visit, rating, has_magnet| VisitForm {
        city_id,
        country_id: None,
        region_id: None,
        date_of_visit,
        has_magnet,
        impression: None,
        rating,
    };
    // Tver: 2 次，平均 4 分，有磁铁；Torzhok: 1 次，2 分；Rzhev、Staritsa 未访问
    visits
        .create(user.id, form(102, NaiveDate::from_ymd_opt(2019, 6, 1), 5, true))
        .await
        .unwrap();
    visits
        .create(user.id, form(102, NaiveDate::from_ymd_opt(2021, 8, 2), 3, false))
        .await
        .unwrap();
    visits
        .create(user.id, form(103, NaiveDate::from_ymd_opt(2020, 9, 9), 2, false))
        .await
        .unwrap();

    let cases = [
        ("name_up", vec![104, 105, 103, 102]),
        ("name_down", vec![102, 103, 105, 104]),
        ("rating_down", vec![102, 103, 104, 105]),
        ("rating_up", vec![103, 102, 104, 105]),
        ("first_visit_date_up", vec![102, 103, 104, 105]),
        ("first_visit_date_down", vec![103, 102, 104, 105]),
        ("last_visit_date_up", vec![103, 102, 104, 105]),
        ("last_visit_date_down", vec![102, 103, 104, 105]),
        ("default", vec![102, 103, 104, 105]),
        ("number_of_visits_down", vec![102, 103, 104, 105]),
        ("number_of_visits_up", vec![104, 105, 103, 102]),
        ("date_of_foundation_up", vec![102, 103, 104, 105]),
        ("date_of_foundation_down", vec![104, 103, 102, 105]),
    ];
    for (sort, expected) in cases {
        let detail = geography
            .region_detail(user.id, 11, None, Some(sort))
            .await
            .unwrap();
        let ids: Vec<i32> = detail.cities.iter().map(|c| c.city_id).collect();
        assert_eq!(ids, expected, "sort {}", sort);
    }

    let magnet = geography
        .region_detail(user.id, 11, Some("magnet"), None)
        .await
        .unwrap();
    let ids: Vec<i32> = magnet.cities.iter().map(|c| c.city_id).collect();
    assert_eq!(ids, vec![102]);
    assert_eq!(magnet.total_cities, 4);

    // 未访问的城市也算作没有磁铁
    let no_magnet = geography
        .region_detail(user.id, 11, Some("no_magnet"), None)
        .await
        .unwrap();
    let ids: Vec<i32> = no_magnet.cities.iter().map(|c| c.city_id).collect();
    assert_eq!(ids, vec![104, 105, 103]);

    // Moscow 0/2，Tver 2/4
    let visited_up = geography
        .region_stats(user.id, 1, None, Some("visited_up"))
        .await
        .unwrap();
    let ids: Vec<i32> = visited_up.regions.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10, 11]);

    let ratio_up = geography
        .region_stats(user.id, 1, None, Some("ratio_up"))
        .await
        .unwrap();
    assert_eq!(ratio_up.regions[0].ratio, 0);
    assert_eq!(ratio_up.regions[1].ratio, 50);

    let not_visited = geography
        .region_stats(user.id, 1, Some("not_visited"), None)
        .await
        .unwrap();
    let ids: Vec<i32> = not_visited.regions.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10]);
}

// =============================================================================
// Visited countries
// =============================================================================

#[tokio::test]
async fn test_visited_countries() {
    let (_dir, storage) = test_storage("visited_countries").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "sam").await;
    let visits = VisitedCityService::new(storage.clone());
    let countries = VisitedCountryService::new(storage.clone());

    let added = countries.add(user.id, "by").await.unwrap();
    assert_eq!(added.code, "BY");
    let err = countries.add(user.id, "BY").await.unwrap_err();
    assert!(matches!(err, TravelbookError::Conflict(_)));
    let err = countries.add(user.id, "ZZ").await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));
    assert_eq!(countries.list(user.id).await.unwrap().len(), 1);

    add_visit(&visits, user.id, 100, None).await;
    add_visit(&visits, user.id, 102, None).await;
    add_visit(&visits, user.id, 200, None).await;
    let summary = countries.summary(user.id).await.unwrap();
    let russia = summary.iter().find(|c| c.code == "RU").unwrap();
    assert_eq!(russia.visited_cities, 2);
    assert!(!russia.marked);
    assert!(summary.iter().find(|c| c.code == "BY").unwrap().marked);

    countries.delete(user.id, "BY").await.unwrap();
    let err = countries.delete(user.id, "BY").await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_country_marks_conflict() {
    let (_dir, storage) = test_storage("visited_countries_race").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "uma").await;
    let countries = std::sync::Arc::new(VisitedCountryService::new(storage.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let countries = countries.clone();
            let user_id = user.id;
            tokio::spawn(async move { countries.add(user_id, "RU").await })
        })
        .collect();
    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert!(matches!(e, TravelbookError::Conflict(_)), "{}", e),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(countries.list(user.id).await.unwrap().len(), 1);
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_city_list_defaults() {
    let (_dir, storage) = test_storage("settings_defaults").await;
    let user = create_user(&storage, "tina").await;
    let settings = SettingsService::new(storage.clone());

    let form = |parameter_type, value: &str| CityListSettingForm {
        parameter_type,
        parameter_value: value.to_string(),
    };

    settings
        .save_city_list_default(user.id, form(ParameterType::Sort, "rating_down"))
        .await
        .unwrap();
    // 同一类型再次保存时覆盖
    settings
        .save_city_list_default(user.id, form(ParameterType::Sort, "name_up"))
        .await
        .unwrap();
    let saved = settings.list_city_list_defaults(user.id).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].parameter_value, "name_up");

    let err = settings
        .save_city_list_default(user.id, form(ParameterType::Filter, "name_up"))
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::UnknownParameter(_)));

    settings
        .delete_city_list_default(user.id, ParameterType::Sort)
        .await
        .unwrap();
    let err = settings
        .delete_city_list_default(user.id, ParameterType::Sort)
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));
}

#[tokio::test]
async fn test_district_map_colors() {
    let (_dir, storage) = test_storage("settings_colors").await;
    let user = create_user(&storage, "uma").await;
    let settings = SettingsService::new(storage.clone());

    assert_eq!(
        settings.district_map_colors(user.id).await.unwrap(),
        DistrictMapColors::default()
    );

    let saved = settings
        .save_district_map_colors(
            user.id,
            DistrictMapColors {
                color_visited: "#ABCDEF".to_string(),
                color_not_visited: "#123456".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.color_visited, "#abcdef");
    assert_eq!(settings.district_map_colors(user.id).await.unwrap(), saved);

    let err = settings
        .save_district_map_colors(
            user.id,
            DistrictMapColors {
                color_visited: "green".to_string(),
                color_not_visited: "#123456".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::Validation(_)));

    let reset = settings.reset_district_map_colors(user.id).await.unwrap();
    assert_eq!(reset, DistrictMapColors::default());
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_statistics_summary() {
    let (_dir, storage) = test_storage("statistics").await;
    seed_geography(&storage).await;
    let alice = create_user(&storage, "alice").await;
    let bob = create_user(&storage, "bob").await;
    let visits = VisitedCityService::new(storage.clone());
    let stats = StatisticsService::new(storage.clone());

    let this_year = Utc::now().year();
    let today = Utc::now().date_naive();
    let last_year = NaiveDate::from_ymd_opt(this_year - 1, 3, 1);

    add_visit(&visits, alice.id, 100, Some(today)).await;
    add_visit(&visits, alice.id, 100, last_year).await;
    add_visit(&visits, alice.id, 101, last_year).await;
    add_visit(&visits, alice.id, 200, None).await;
    add_visit(&visits, bob.id, 102, None).await;

    let summary = stats.summary(alice.id, None).await.unwrap();
    assert_eq!(summary.visited_cities, 3);
    assert_eq!(summary.total_cities, 6);
    assert_eq!(summary.ratio, 50);
    assert_eq!(summary.visits, 4);
    assert_eq!(summary.visited_cities_this_year, 1);
    assert_eq!(summary.visited_cities_last_year, 2);
    assert_eq!(summary.visited_countries, 2);
    assert_eq!(summary.user_rank, Some(1));
    assert!(summary.regions.is_none());

    let russia = stats.summary(alice.id, Some(1)).await.unwrap();
    assert_eq!(russia.visited_cities, 2);
    assert_eq!(russia.total_cities, 5);
    let regions = russia.regions.unwrap();
    assert_eq!((regions.total, regions.visited, regions.finished), (2, 1, 1));

    assert_eq!(stats.summary(bob.id, None).await.unwrap().user_rank, Some(2));
    let newcomer = create_user(&storage, "carol").await;
    assert_eq!(stats.summary(newcomer.id, None).await.unwrap().user_rank, None);

    let err = stats.summary(alice.id, Some(404)).await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));
}
