//! 地理数据端点

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::api::middleware::AuthUser;
use crate::services::{GeographyService, VisitedCityService};

use super::helpers::api_result;
use super::types::FilterSortQuery;

pub async fn list_countries(
    _user: AuthUser,
    geography: web::Data<Arc<GeographyService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(geography.list_countries().await))
}

pub async fn regions_of_country(
    _user: AuthUser,
    path: web::Path<i32>,
    geography: web::Data<Arc<GeographyService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(geography.regions_of_country(path.into_inner()).await))
}

pub async fn cities_of_country(
    _user: AuthUser,
    path: web::Path<i32>,
    geography: web::Data<Arc<GeographyService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(geography.cities_of_country(path.into_inner()).await))
}

pub async fn cities_of_region(
    _user: AuthUser,
    path: web::Path<i32>,
    geography: web::Data<Arc<GeographyService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(geography.cities_of_region(path.into_inner()).await))
}

/// 国家内各地区的访问统计
pub async fn region_stats(
    user: AuthUser,
    path: web::Path<i32>,
    query: web::Query<FilterSortQuery>,
    geography: web::Data<Arc<GeographyService>>,
) -> ActixResult<impl Responder> {
    let country_id = path.into_inner();
    trace!("Region stats for user {} in country {}", user.id, country_id);
    Ok(api_result(
        geography
            .region_stats(
                user.id,
                country_id,
                query.filter.as_deref(),
                query.sort.as_deref(),
            )
            .await,
    ))
}

pub async fn region_detail(
    user: AuthUser,
    path: web::Path<i32>,
    query: web::Query<FilterSortQuery>,
    geography: web::Data<Arc<GeographyService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        geography
            .region_detail(
                user.id,
                path.into_inner(),
                query.filter.as_deref(),
                query.sort.as_deref(),
            )
            .await,
    ))
}

pub async fn city_detail(
    user: AuthUser,
    path: web::Path<i32>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(visits.city_detail(user.id, path.into_inner()).await))
}

pub async fn city_visit_years(
    user: AuthUser,
    path: web::Path<i32>,
    visits: web::Data<Arc<VisitedCityService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        visits.visit_years_of_city(user.id, path.into_inner()).await,
    ))
}
