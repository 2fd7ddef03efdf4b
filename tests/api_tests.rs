//! HTTP API integration tests
//!
//! Runs the full `/api/v1` scope behind the authentication middleware plus the
//! health routes against a temporary SQLite database.

mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::{Value, json};

use travelbook::api::constants::{ACCESS_COOKIE_NAME, API_PREFIX};
use travelbook::api::middleware::{RequestIdMiddleware, UserAuth};
use travelbook::api::services::{AppStartTime, api_v1_routes, health_routes};
use travelbook::runtime::lifetime::startup::StartupContext;

use common::{seed_geography, test_storage};

macro_rules! test_app {
    ($context:expr) => {{
        let context = $context.clone();
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .configure(|cfg| context.configure(cfg))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .service(
                    web::scope(API_PREFIX)
                        .wrap(UserAuth)
                        .configure(api_v1_routes),
                )
                .service(health_routes()),
        )
        .await
    }};
}

fn api(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

fn peer() -> std::net::SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// 注册用户并返回 access token
macro_rules! register {
    ($app:expr, $username:expr) => {{
        let req = TestRequest::post()
            .uri(&api("/auth/register"))
            .set_json(json!({
                "username": $username,
                "email": format!("{}@example.com", $username),
                "password": "correct-horse-battery"
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body["data"]["access_token"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let (_dir, storage) = test_storage("api_auth").await;
    let context = StartupContext::new(storage);
    let app = test_app!(context);

    let req = TestRequest::post()
        .uri(&api("/auth/register"))
        .set_json(json!({
            "username": "wanderer",
            "email": "wanderer@example.com",
            "password": "correct-horse-battery"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(
        resp.response()
            .cookies()
            .any(|c| c.name() == ACCESS_COOKIE_NAME)
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["user"]["username"], "wanderer");

    // 同名注册
    let req = TestRequest::post()
        .uri(&api("/auth/register"))
        .set_json(json!({
            "username": "wanderer",
            "email": "other@example.com",
            "password": "correct-horse-battery"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2006);

    let req = TestRequest::post()
        .uri(&api("/auth/login"))
        .peer_addr(peer())
        .set_json(json!({ "username": "wanderer", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2000);

    let req = TestRequest::post()
        .uri(&api("/auth/login"))
        .peer_addr(peer())
        .set_json(json!({ "username": "wanderer", "password": "correct-horse-battery" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let req = TestRequest::get()
        .uri(&api("/auth/me"))
        .insert_header(("Authorization", format!("Bearer {}", access)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], "wanderer");

    // refresh token 不能当作 access token 使用
    let req = TestRequest::get()
        .uri(&api("/auth/me"))
        .insert_header(("Authorization", format!("Bearer {}", refresh)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri(&api("/auth/refresh"))
        .set_json(json!({ "refresh_token": refresh }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::post()
        .uri(&api("/auth/refresh"))
        .set_json(json!({ "refresh_token": "garbage" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2002);
}

#[actix_web::test]
async fn test_protected_routes_require_token() {
    let (_dir, storage) = test_storage("api_protected").await;
    let context = StartupContext::new(storage);
    let app = test_app!(context);

    for path in ["/visited-cities", "/countries", "/stats", "/auth/me"] {
        let req = TestRequest::get().uri(&api(path)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 1001);
    }

    let req = TestRequest::get()
        .uri(&api("/visited-cities"))
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_visit_flow_over_http() {
    let (_dir, storage) = test_storage("api_visits").await;
    seed_geography(&storage).await;
    let context = StartupContext::new(storage);
    let app = test_app!(context);
    let token = register!(app, "traveller");
    let auth = ("Authorization", format!("Bearer {}", token));

    let req = TestRequest::post()
        .uri(&api("/visited-cities"))
        .insert_header(auth.clone())
        .set_json(json!({
            "city_id": 102,
            "date_of_visit": "2021-08-02",
            "has_magnet": true,
            "impression": "Great embankment",
            "rating": 5
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let visit_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["is_first_visit"], true);

    // 同一天重复访问
    let req = TestRequest::post()
        .uri(&api("/visited-cities"))
        .insert_header(auth.clone())
        .set_json(json!({ "city_id": 102, "date_of_visit": "2021-08-02", "rating": 4 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3001);

    let req = TestRequest::get()
        .uri(&api("/visited-cities?filter=magnet&sort=name_up&page_size=10"))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["page_size"], 10);
    assert_eq!(body["data"]["filter"], "magnet");
    assert_eq!(body["data"]["cities"][0]["title"], "Tver");

    let req = TestRequest::get()
        .uri(&api("/visited-cities?sort=upside_down"))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1006);

    let req = TestRequest::get()
        .uri(&api("/visited-cities/years"))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([2021]));

    let req = TestRequest::get()
        .uri(&api("/visited-cities/export?format=csv"))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/csv"))
    );
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Tver"));

    let req = TestRequest::get()
        .uri(&api("/visited-cities/export?format=xml"))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::get()
        .uri(&api("/cities/102"))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["number_of_visits"], 1);
    assert_eq!(body["data"]["rank_in_country"]["by_users"], 1);

    let req = TestRequest::get()
        .uri(&api("/countries/1/regions/stats?filter=visited"))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["regions"].as_array().unwrap().len(), 1);

    let req = TestRequest::get()
        .uri(&api("/stats?country_id=1"))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["visited_cities"], 1);
    assert_eq!(body["data"]["total_cities"], 5);

    let req = TestRequest::delete()
        .uri(&api(&format!("/visited-cities/{}", visit_id)))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get()
        .uri(&api(&format!("/visited-cities/{}", visit_id)))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3000);
}

#[actix_web::test]
async fn test_settings_and_collections_over_http() {
    let (_dir, storage) = test_storage("api_settings").await;
    seed_geography(&storage).await;
    let context = StartupContext::new(storage);
    let app = test_app!(context);
    let owner = ("Authorization", format!("Bearer {}", register!(app, "curator")));
    let guest = ("Authorization", format!("Bearer {}", register!(app, "guest")));

    let req = TestRequest::post()
        .uri(&api("/settings/city-list"))
        .insert_header(owner.clone())
        .set_json(json!({ "parameter_type": "sort", "parameter_value": "nonsense" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 4001);

    let req = TestRequest::delete()
        .uri(&api("/settings/city-list/filter"))
        .insert_header(owner.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::put()
        .uri(&api("/settings/district-map-colors"))
        .insert_header(owner.clone())
        .set_json(json!({ "color_visited": "#00FF00", "color_not_visited": "#cccccc" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["color_visited"], "#00ff00");

    let req = TestRequest::get()
        .uri(&api("/collections?sort=name_down"))
        .insert_header(owner.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["collections"][0]["title"], "Upper Volga");

    let req = TestRequest::post()
        .uri(&api("/personal-collections"))
        .insert_header(owner.clone())
        .set_json(json!({ "title": "Tver trip", "city_ids": [102, 103], "is_public": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let collection_id = body["data"]["id"].as_i64().unwrap();

    let req = TestRequest::get()
        .uri(&api("/personal-collections/public"))
        .insert_header(guest.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = TestRequest::put()
        .uri(&api(&format!("/personal-collections/{}", collection_id)))
        .insert_header(guest.clone())
        .set_json(json!({ "title": "Hijacked", "city_ids": [100] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 5001);

    let req = TestRequest::post()
        .uri(&api(&format!("/personal-collections/{}/copy", collection_id)))
        .insert_header(guest.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["copied_from_id"], collection_id);

    let req = TestRequest::post()
        .uri(&api(&format!("/personal-collections/{}/public", collection_id)))
        .insert_header(owner.clone())
        .set_json(json!({ "is_public": false }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["is_public"], false);

    let req = TestRequest::get()
        .uri(&api(&format!("/personal-collections/{}", collection_id)))
        .insert_header(guest)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::post()
        .uri(&api("/visited-countries"))
        .insert_header(owner.clone())
        .set_json(json!({ "code": "by" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = TestRequest::post()
        .uri(&api("/visited-countries"))
        .insert_header(owner)
        .set_json(json!({ "code": "BY" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3011);
}

#[actix_web::test]
async fn test_health_and_request_id() {
    let (_dir, storage) = test_storage("api_health").await;
    let context = StartupContext::new(storage);
    let app = test_app!(context);

    let req = TestRequest::get()
        .uri("/health")
        .insert_header(("X-Request-ID", "req-1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("X-Request-ID").unwrap(), "req-1");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["storage"]["backend"], "sqlite");

    let req = TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
