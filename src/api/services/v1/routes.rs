//! API v1 路由配置
//!
//! 路由按功能模块拆分，固定路径必须注册在带参数的路径之前。

use actix_web::web;

use super::auth::{login, login_rate_limiter, logout, me, refresh_token, register};
use super::{collections, geography, personal_collections, settings, stats, visited_cities, visited_countries};

/// 认证路由 `/auth`
///
/// - POST /auth/register - 注册
/// - POST /auth/login - 登录（带限流）
/// - POST /auth/refresh - 刷新 token
/// - POST /auth/logout - 登出
/// - GET /auth/me - 当前用户
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .route("/refresh", web::post().to(refresh_token))
        .route("/logout", web::post().to(logout))
        .route("/me", web::get().to(me))
}

/// 地理数据路由 `/countries` `/regions` `/cities`
pub fn geography_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/countries")
            .route("", web::get().to(geography::list_countries))
            .route(
                "/{id}/regions/stats",
                web::get().to(geography::region_stats),
            )
            .route("/{id}/regions", web::get().to(geography::regions_of_country))
            .route("/{id}/cities", web::get().to(geography::cities_of_country)),
    )
    .service(
        web::scope("/regions")
            .route("/{id}/cities", web::get().to(geography::cities_of_region))
            .route("/{id}", web::get().to(geography::region_detail)),
    )
    .service(
        web::scope("/cities")
            .route(
                "/{id}/visit-years",
                web::get().to(geography::city_visit_years),
            )
            .route("/{id}", web::get().to(geography::city_detail)),
    );
}

/// 访问记录路由 `/visited-cities`
///
/// /years 与 /export 必须在 /{id} 之前
pub fn visited_cities_routes() -> actix_web::Scope {
    web::scope("/visited-cities")
        .route("", web::get().to(visited_cities::list_visited_cities))
        .route("", web::post().to(visited_cities::create_visit))
        .route("/years", web::get().to(visited_cities::visit_years))
        .route(
            "/export",
            web::get().to(visited_cities::export_visited_cities),
        )
        .route("/{id}", web::get().to(visited_cities::get_visit))
        .route("/{id}", web::put().to(visited_cities::update_visit))
        .route("/{id}", web::delete().to(visited_cities::delete_visit))
}

/// 国家标记路由 `/visited-countries`
pub fn visited_countries_routes() -> actix_web::Scope {
    web::scope("/visited-countries")
        .route("", web::get().to(visited_countries::list_visited_countries))
        .route("", web::post().to(visited_countries::add_visited_country))
        .route(
            "/summary",
            web::get().to(visited_countries::visited_countries_summary),
        )
        .route(
            "/{code}",
            web::delete().to(visited_countries::delete_visited_country),
        )
}

/// 设置路由 `/settings`
pub fn settings_routes() -> actix_web::Scope {
    web::scope("/settings")
        .route("/city-list", web::get().to(settings::list_city_list_defaults))
        .route("/city-list", web::post().to(settings::save_city_list_default))
        .route(
            "/city-list/{type}",
            web::delete().to(settings::delete_city_list_default),
        )
        .route(
            "/district-map-colors",
            web::get().to(settings::get_district_map_colors),
        )
        .route(
            "/district-map-colors",
            web::put().to(settings::save_district_map_colors),
        )
        .route(
            "/district-map-colors",
            web::delete().to(settings::reset_district_map_colors),
        )
}

/// 集合路由 `/collections` 与 `/personal-collections`
pub fn collections_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/collections")
            .route("", web::get().to(collections::list_collections))
            .route("/{id}", web::get().to(collections::get_collection)),
    )
    .service(
        web::scope("/personal-collections")
            .route("", web::get().to(personal_collections::list_own_collections))
            .route("", web::post().to(personal_collections::create_collection))
            .route(
                "/public",
                web::get().to(personal_collections::list_public_collections),
            )
            .route(
                "/{id}/public",
                web::post().to(personal_collections::set_collection_public),
            )
            .route(
                "/{id}/copy",
                web::post().to(personal_collections::copy_collection),
            )
            .route("/{id}", web::get().to(personal_collections::get_collection))
            .route("/{id}", web::put().to(personal_collections::update_collection))
            .route(
                "/{id}",
                web::delete().to(personal_collections::delete_collection),
            ),
    );
}

/// API v1 路由（挂载在 `/api/v1` 下）
pub fn api_v1_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(auth_routes())
        .configure(geography_routes)
        .service(visited_cities_routes())
        .service(visited_countries_routes())
        .service(settings_routes())
        .configure(collections_routes)
        .route("/stats", web::get().to(stats::get_stats));
}
