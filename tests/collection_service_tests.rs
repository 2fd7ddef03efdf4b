//! Curated and personal collection tests

mod common;

use chrono::NaiveDate;

use travelbook::errors::TravelbookError;
use travelbook::services::personal_collection_service::PersonalCollectionForm;
use travelbook::services::visited_city_service::VisitForm;
use travelbook::services::{CollectionService, PersonalCollectionService, VisitedCityService};

use common::{create_user, seed_geography, test_storage};

async fn add_visit(service: &VisitedCityService, user_id: i32, city_id: i32) {
    service
        .create(
            user_id,
            VisitForm {
                city_id,
                country_id: None,
                region_id: None,
                date_of_visit: NaiveDate::from_ymd_opt(2020, 6, 1),
                has_magnet: false,
                impression: None,
                rating: 4,
            },
        )
        .await
        .unwrap();
}

fn form(title: &str, city_ids: Vec<i32>, is_public: bool) -> PersonalCollectionForm {
    PersonalCollectionForm {
        title: title.to_string(),
        city_ids,
        is_public,
    }
}

// =============================================================================
// Curated collections
// =============================================================================

#[tokio::test]
async fn test_collection_progress_and_counters() {
    let (_dir, storage) = test_storage("collections_progress").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "nina").await;
    let visits = VisitedCityService::new(storage.clone());
    let collections = CollectionService::new(storage.clone());

    // Golden Ring = {101, 102} 全部访问；Upper Volga = {102, 103, 104} 访问 1 个
    add_visit(&visits, user.id, 101).await;
    add_visit(&visits, user.id, 102).await;

    let list = collections.list(user.id, None, None).await.unwrap();
    assert_eq!(list.sort, "name_up");
    assert_eq!(list.total_collections, 2);
    assert_eq!(list.finished_collections, 1);
    assert_eq!(list.started_collections, 1);

    let golden = &list.collections[0];
    assert_eq!(golden.title, "Golden Ring");
    assert!(golden.finished);
    assert_eq!(golden.ratio, 100);
    let volga = &list.collections[1];
    assert_eq!(volga.visited_cities, 1);
    assert_eq!(volga.ratio, 33);

    let finished = collections
        .list(user.id, Some("finished"), None)
        .await
        .unwrap();
    assert_eq!(finished.collections.len(), 1);
    assert_eq!(finished.collections[0].id, 1);
    // 计数不受筛选影响
    assert_eq!(finished.total_collections, 2);

    let by_progress = collections
        .list(user.id, None, Some("progress_up"))
        .await
        .unwrap();
    assert_eq!(by_progress.collections[0].id, 2);

    let err = collections
        .list(user.id, Some("halfway"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::UnknownParameter(_)));
}

#[tokio::test]
async fn test_collection_detail() {
    let (_dir, storage) = test_storage("collections_detail").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "oleg").await;
    let visits = VisitedCityService::new(storage.clone());
    let collections = CollectionService::new(storage.clone());
    add_visit(&visits, user.id, 103).await;

    let detail = collections.detail(user.id, 2).await.unwrap();
    assert_eq!(detail.progress.total_cities, 3);
    assert_eq!(detail.progress.visited_cities, 1);
    let titles: Vec<&str> = detail.cities.iter().map(|c| c.city.title.as_str()).collect();
    assert_eq!(titles, vec!["Rzhev", "Torzhok", "Tver"]);
    assert!(detail.cities[1].is_visited);

    let err = collections.detail(user.id, 99).await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));
}

#[tokio::test]
async fn test_collection_not_started_and_progress_sorts() {
    let (_dir, storage) = test_storage("collections_not_started").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "olga").await;
    let visits = VisitedCityService::new(storage.clone());
    let collections = CollectionService::new(storage.clone());

    // 只访问 Torzhok：Golden Ring 0/2，Upper Volga 1/3
    add_visit(&visits, user.id, 103).await;

    let not_started = collections
        .list(user.id, Some("not_started"), None)
        .await
        .unwrap();
    let titles: Vec<&str> = not_started.collections.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Golden Ring"]);

    let started = collections.list(user.id, Some("started"), None).await.unwrap();
    let titles: Vec<&str> = started.collections.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Upper Volga"]);

    let up = collections.list(user.id, None, Some("progress_up")).await.unwrap();
    let ids: Vec<i32> = up.collections.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let down = collections.list(user.id, None, Some("progress_down")).await.unwrap();
    let ids: Vec<i32> = down.collections.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

// =============================================================================
// Personal collections
// =============================================================================

#[tokio::test]
async fn test_personal_collection_lifecycle() {
    let (_dir, storage) = test_storage("personal_lifecycle").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "pavel").await;
    let service = PersonalCollectionService::new(storage.clone());

    let created = service
        .create(user.id, form("  Weekend trips ", vec![100, 101, 100], false))
        .await
        .unwrap();
    assert_eq!(created.title, "Weekend trips");
    assert_eq!(created.city_count, 2);
    assert!(!created.is_public);

    let updated = service
        .update(user.id, created.id, form("Weekend trips", vec![102], true))
        .await
        .unwrap();
    assert_eq!(updated.city_count, 1);
    assert!(updated.is_public);

    let detail = service.get(user.id, created.id).await.unwrap();
    assert!(detail.is_owner);
    assert_eq!(detail.cities.len(), 1);
    assert_eq!(detail.cities[0].city.id, 102);

    let hidden = service.set_public(user.id, created.id, false).await.unwrap();
    assert!(!hidden.is_public);

    assert_eq!(service.list_own(user.id).await.unwrap().len(), 1);
    service.delete(user.id, created.id).await.unwrap();
    assert!(service.list_own(user.id).await.unwrap().is_empty());
    let err = service.get(user.id, created.id).await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));
}

#[tokio::test]
async fn test_personal_collection_validation() {
    let (_dir, storage) = test_storage("personal_validation").await;
    seed_geography(&storage).await;
    let user = create_user(&storage, "quinn").await;
    let service = PersonalCollectionService::new(storage.clone());

    let err = service.create(user.id, form("Empty", vec![], false)).await.unwrap_err();
    assert!(matches!(err, TravelbookError::Validation(_)));

    let err = service
        .create(user.id, form("Ghosts", vec![100, 9999], false))
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::Validation(_)));

    let err = service.create(user.id, form(" ", vec![100], false)).await.unwrap_err();
    assert!(matches!(err, TravelbookError::Validation(_)));
}

#[tokio::test]
async fn test_personal_collection_visibility_and_ownership() {
    let (_dir, storage) = test_storage("personal_visibility").await;
    seed_geography(&storage).await;
    let owner = create_user(&storage, "owner").await;
    let viewer = create_user(&storage, "viewer").await;
    let visits = VisitedCityService::new(storage.clone());
    let service = PersonalCollectionService::new(storage.clone());

    let private = service
        .create(owner.id, form("Private", vec![100], false))
        .await
        .unwrap();
    let public = service
        .create(owner.id, form("Public", vec![100, 200], true))
        .await
        .unwrap();

    let err = service.get(viewer.id, private.id).await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));

    // 访问状态按查看者计算
    add_visit(&visits, viewer.id, 200).await;
    let detail = service.get(viewer.id, public.id).await.unwrap();
    assert!(!detail.is_owner);
    assert_eq!(detail.visited_cities, 1);

    let err = service
        .update(viewer.id, public.id, form("Mine now", vec![100], true))
        .await
        .unwrap_err();
    assert!(matches!(err, TravelbookError::Forbidden(_)));
    let err = service.delete(viewer.id, public.id).await.unwrap_err();
    assert!(matches!(err, TravelbookError::Forbidden(_)));

    let others = service.list_public(viewer.id).await.unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].id, public.id);
    assert!(service.list_public(owner.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_copy_public_collection() {
    let (_dir, storage) = test_storage("personal_copy").await;
    seed_geography(&storage).await;
    let owner = create_user(&storage, "author").await;
    let reader = create_user(&storage, "reader").await;
    let service = PersonalCollectionService::new(storage.clone());

    let public = service
        .create(owner.id, form("Volga", vec![102, 103], true))
        .await
        .unwrap();
    let private = service
        .create(owner.id, form("Secret", vec![104], false))
        .await
        .unwrap();

    let copy = service.copy(reader.id, public.id).await.unwrap();
    assert_eq!(copy.owner_id, reader.id);
    assert_eq!(copy.title, "Volga");
    assert_eq!(copy.city_count, 2);
    assert!(!copy.is_public);
    assert!(copy.is_copied);
    assert_eq!(copy.copied_from_id, Some(public.id));

    let err = service.copy(owner.id, public.id).await.unwrap_err();
    assert!(matches!(err, TravelbookError::Validation(_)));
    let err = service.copy(reader.id, private.id).await.unwrap_err();
    assert!(matches!(err, TravelbookError::NotFound(_)));

    // 源集合删除后副本仍然存在
    service.delete(owner.id, public.id).await.unwrap();
    let detail = service.get(reader.id, copy.id).await.unwrap();
    assert_eq!(detail.cities.len(), 2);
}
